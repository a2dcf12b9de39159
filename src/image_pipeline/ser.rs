//! SER capture reading module
//!
//! Parses the fixed SER header and streams decoded frames from the payload.

mod header;
mod reader;
pub mod types;

#[cfg(test)]
mod tests;

pub use header::read_header;
pub use reader::{SerFrames, SerReader};
pub use types::{ByteOrder, ColorId, Frame, SerHeader};
