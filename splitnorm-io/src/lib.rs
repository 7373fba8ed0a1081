//! Splitnorm I/O: the platform layer.
//!
//! Hardware-facing helpers used by the normalization engine: core topology
//! discovery, thread pinning, and page-aligned vector storage.

pub mod platform;
pub mod memory;

// Re-exports for easier access by splitnorm-core
pub use memory::{AlignedVector, MemoryError};
pub use platform::topology::SystemTopology;
pub use platform::affinity;
