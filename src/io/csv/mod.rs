//! CSV input for attribute tables and output for overlay results.

mod read;
mod write;

pub use read::*;
pub use write::*;
