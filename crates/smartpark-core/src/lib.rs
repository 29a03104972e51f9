pub mod constants;
pub mod error;
pub mod plate;
pub mod types;

pub use error::{Error, Result};
pub use plate::{Plate, extract_plate_from_document, normalize};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
