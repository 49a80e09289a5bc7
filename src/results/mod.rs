//! Result types and the es output parser
//!
//! Records carry whatever columns es printed; nothing here knows which
//! columns were requested.

mod parser;
mod types;

pub use parser::{parse_csv, SIZE_COLUMN};
pub use types::*;
