//! Splitnorm Core: two-phase fork-join L2 normalization.
//!
//! A vector is split into one contiguous segment per worker thread. Phase 1
//! reduces each segment to a partial sum of squares; after every worker is
//! joined the norm is derived, and phase 2 divides each segment in place by
//! it, over the same segments.
//!
//! ```no_run
//! let mut v = vec![3.0f32, 4.0];
//! let norm = splitnorm_core::normalize(&mut v, 2).unwrap();
//! assert_eq!(norm, 5.0);
//! ```

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod datagen;
pub mod error;
pub mod fork_join;
pub mod kernel;
pub mod normalize;
pub mod partition;
pub mod worker;

pub use cancel::CancelToken;
pub use config::{KernelChoice, NormalizeConfig, ThreadPolicy, ZeroNormPolicy};
pub use error::{NormError, Phase};
pub use normalize::{normalize, normalize_sequential, NormReport, Normalizer};
pub use partition::{Partition, Segment};
pub use worker::Exponent;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
