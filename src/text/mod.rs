pub mod chunker;
pub mod phonemize;

pub use chunker::{split_into_chunks, DEFAULT_MAX_CHUNK_SIZE};
