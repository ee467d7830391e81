//! Document chunking: splits raw text into overlapping, bounded-size
//! passages with offsets traceable back into the original content.

pub mod clean;
pub mod profile;
pub mod splitter;

pub use clean::clean_text;
pub use profile::{profile_for, ChunkProfile};
pub use splitter::{chunk, ChunkPiece};
