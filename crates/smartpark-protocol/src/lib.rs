pub mod codec;
pub mod message;
pub mod parser;

pub use codec::ControllerCodec;
pub use message::{ControllerMessage, GateCommand};
pub use parser::{LineParser, parse_slot_list};
