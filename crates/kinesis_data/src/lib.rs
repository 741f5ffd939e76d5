//! Core data structures for the Kinesis simulation.
//!
//! Everything in this crate is plain, serializable data: genomes carry no
//! physics handles and frames carry no references into the simulation.

pub mod frame;
pub mod genome;
pub mod report;

pub use frame::{CameraState, CreatureFrame, FrameSnapshot, HudState, SpringSegment, Stroke};
pub use genome::{Genome, Point3, SpringGene};
pub use report::GenerationReport;
