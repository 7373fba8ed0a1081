use crate::cancel::CancelToken;
use crate::config::{NormalizeConfig, ZeroNormPolicy};
use crate::coordinator::{ReductionCoordinator, ScalingCoordinator};
use crate::error::{NormError, Phase, Result};
use crate::kernel::Kernels;
use crate::partition::Partition;
use crate::worker::{Exponent, ReductionWorker, ScalingWorker};
use log::debug;
use splitnorm_io::SystemTopology;
use std::time::{Duration, Instant};

/// Outcome of one successful normalize call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormReport {
    pub sum_of_squares: f64,
    pub norm: f32,
    pub threads: usize,
    pub reduce_elapsed: Duration,
    pub scale_elapsed: Duration,
}

impl NormReport {
    pub fn total_elapsed(&self) -> Duration {
        self.reduce_elapsed + self.scale_elapsed
    }
}

/// Normalizer: the two-phase pipeline.
///
/// # Logic
/// Reduce (exponent 2) → `norm = sqrt(sum)` → scale by `norm`. The sum and
/// its square root stay in f64; only the divisor is narrowed to f32. Both phases
/// share one `Partition`. The reduction phase is fully joined before the norm
/// is derived, and no scaling worker exists before that point.
pub struct Normalizer {
    config: NormalizeConfig,
    kernels: Kernels,
    topology: Option<SystemTopology>,
}

impl Normalizer {
    /// # Errors
    /// Configuration errors from `NormalizeConfig::validate`.
    pub fn new(config: NormalizeConfig) -> Result<Self> {
        config.validate()?;
        let kernels = Kernels::select(config.kernel);
        let topology = config.pin_workers.then(SystemTopology::new);
        Ok(Self { config, kernels, topology })
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn kernels(&self) -> Kernels {
        self.kernels
    }

    pub fn normalize(&self, vector: &mut [f32]) -> Result<NormReport> {
        self.normalize_with_cancel(vector, &CancelToken::new())
    }

    /// Normalizes `vector` in place to unit L2 norm.
    ///
    /// # Errors
    /// Precondition errors before any thread exists; `ZeroNorm` under
    /// `ZeroNormPolicy::Reject` (vector untouched); otherwise the first phase
    /// failure. Any error means the vector must not be treated as normalized.
    pub fn normalize_with_cancel(&self, vector: &mut [f32], cancel: &CancelToken) -> Result<NormReport> {
        let threads = self.config.effective_threads(vector.len())?;
        let partition = Partition::new(vector.len(), threads)?;
        let topology = self.topology.as_ref();
        let interval = self.config.check_interval;

        let reducer = ReductionCoordinator::new(ReductionWorker::new(self.kernels, interval), topology);
        let start = Instant::now();
        let sum_of_squares = reducer.reduce_partitioned(vector, &partition, Exponent::SQUARE, cancel)?;
        let reduce_elapsed = start.elapsed();

        let norm = sum_of_squares.sqrt() as f32;
        debug!("reduce: {} elements, {} threads, norm {} in {:?}", vector.len(), threads, norm, reduce_elapsed);

        if sum_of_squares == 0.0 && self.config.zero_norm == ZeroNormPolicy::Reject {
            return Err(NormError::ZeroNorm);
        }
        if cancel.is_cancelled() {
            return Err(NormError::Cancelled { phase: Phase::Scale });
        }

        let scaler = ScalingCoordinator::new(ScalingWorker::new(self.kernels, interval), topology);
        let start = Instant::now();
        scaler.scale_partitioned(vector, &partition, norm, cancel)?;
        let scale_elapsed = start.elapsed();
        debug!("scale: {} threads in {:?}", threads, scale_elapsed);

        Ok(NormReport { sum_of_squares, norm, threads, reduce_elapsed, scale_elapsed })
    }
}

/// Normalizes `vector` in place with `threads` workers and default settings.
/// Returns the norm the vector was divided by.
pub fn normalize(vector: &mut [f32], threads: usize) -> Result<f32> {
    let report = Normalizer::new(NormalizeConfig::new(threads))?.normalize(vector)?;
    Ok(report.norm)
}

/// Single-threaded reference: same result as `normalize` up to summation order.
/// Returns the norm. A zero vector becomes all NaN.
pub fn normalize_sequential(vector: &mut [f32]) -> f32 {
    let norm = vector.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt() as f32;
    for x in vector.iter_mut() {
        *x /= norm;
    }
    norm
}
