mod error;
mod midi_exporter;
mod midi_importer;
mod model;
mod position;
mod reconcile;
mod session;
mod store;
mod util;

pub mod notation;
pub mod pitch;

pub use error::*;
pub use midi_exporter::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::note::*;
pub use model::request::*;
pub use position::*;
pub use reconcile::*;
pub use session::*;
pub use store::*;
pub use util::*;
