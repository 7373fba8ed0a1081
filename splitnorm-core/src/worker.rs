//! The two per-segment workers.
//!
//! Each worker owns exactly one segment view for the duration of its phase
//! and processes it in chunks of `check_interval` elements, checking the
//! phase token between chunks.

use crate::cancel::ChildToken;
use crate::error::{NormError, Phase, Result};
use crate::kernel::Kernels;
use crate::partition::Segment;

/// Power applied to every element before summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exponent {
    /// `x.powi(k)`. `Int(2)` runs on the dispatched sum-of-squares kernel.
    Int(i32),
    /// `x.powf(p)`. A negative base with a fractional `p` yields NaN.
    Real(f32),
}

impl Exponent {
    pub const SQUARE: Exponent = Exponent::Int(2);

    fn sum_powers(&self, kernels: &Kernels, chunk: &[f32]) -> f64 {
        match *self {
            Exponent::Int(2) => kernels.sum_squares(chunk),
            Exponent::Int(k) => chunk.iter().map(|&x| (x as f64).powi(k)).sum(),
            Exponent::Real(p) => chunk.iter().map(|&x| (x as f64).powf(p as f64)).sum(),
        }
    }
}

/// Reduction phase task: one read-only segment and the exponent.
#[derive(Debug)]
pub struct ReductionTask<'a> {
    pub segment: Segment,
    pub data: &'a [f32],
    pub exponent: Exponent,
}

/// Scaling phase task: one exclusive segment and the divisor.
#[derive(Debug)]
pub struct ScalingTask<'a> {
    pub segment: Segment,
    pub data: &'a mut [f32],
    pub divisor: f32,
}

/// Computes the partial `sum(x^exponent)` of one segment, accumulated in f64.
#[derive(Debug, Clone, Copy)]
pub struct ReductionWorker {
    kernels: Kernels,
    check_interval: usize,
}

impl ReductionWorker {
    pub fn new(kernels: Kernels, check_interval: usize) -> Self {
        Self { kernels, check_interval: check_interval.max(1) }
    }

    /// # Errors
    /// `Cancelled` if the phase token fires before the segment is fully read.
    pub fn run(&self, task: ReductionTask<'_>, cancel: &ChildToken) -> Result<f64> {
        debug_assert_eq!(task.data.len(), task.segment.len);
        let mut sum = 0.0f64;
        for chunk in task.data.chunks(self.check_interval) {
            if cancel.is_cancelled() {
                return Err(NormError::Cancelled { phase: Phase::Reduce });
            }
            sum += task.exponent.sum_powers(&self.kernels, chunk);
        }
        Ok(sum)
    }
}

/// Divides one segment in place.
#[derive(Debug, Clone, Copy)]
pub struct ScalingWorker {
    kernels: Kernels,
    check_interval: usize,
}

impl ScalingWorker {
    pub fn new(kernels: Kernels, check_interval: usize) -> Self {
        Self { kernels, check_interval: check_interval.max(1) }
    }

    /// A zero divisor is not special-cased: IEEE division applies.
    ///
    /// # Errors
    /// `Cancelled` if the phase token fires; chunks already divided stay divided.
    pub fn run(&self, task: ScalingTask<'_>, cancel: &ChildToken) -> Result<()> {
        debug_assert_eq!(task.data.len(), task.segment.len);
        for chunk in task.data.chunks_mut(self.check_interval) {
            if cancel.is_cancelled() {
                return Err(NormError::Cancelled { phase: Phase::Scale });
            }
            self.kernels.divide(chunk, task.divisor);
        }
        Ok(())
    }
}
