mod bitarray;
mod error;
pub mod selftest;
pub mod session;

pub use bitarray::{BitArray, Wrapped, BITS_PER_BYTE, DEFAULT_WRAP_WIDTH};
pub use error::{Error, Result};
pub use session::{Command, Output, ScriptSummary, Session};
