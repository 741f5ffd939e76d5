//! # Kinesis IO
//!
//! Persistence layer for the Kinesis simulation.
//!
//! This crate provides:
//! - Structured error handling for every IO path
//! - JSON and HexDNA encodings of genomes
//! - Gzip-compressed checkpoints of the record and elite genomes
//! - A per-generation history log written as JSON lines

/// Checkpoints: record, generation and elites on disk
pub mod checkpoint;
/// Error types and result aliases for IO operations
pub mod error;
/// Append-only generation history
pub mod history;
/// Validated JSON and HexDNA helpers
pub mod serialization;

pub use checkpoint::Checkpoint;
pub use error::{IoError, Result};
pub use history::{read_reports, HistoryLogger};
pub use serialization::{from_hex_dna, from_json, genome_from_hex_dna, to_hex_dna, to_json};
