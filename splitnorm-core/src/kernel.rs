#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::config::KernelChoice;
use log::info;

/// Function pointer signature for the sum-of-squares reduction over a segment.
/// Squares are accumulated in f64: squares of finite f32 values can neither
/// overflow nor underflow there.
pub type SumSquaresFunc = unsafe fn(*const f32, usize) -> f64;

/// Function pointer signature for in-place division of a segment.
pub type DivideFunc = unsafe fn(*mut f32, usize, f32);

/// The Reference Implementation.
///
/// # Safety
/// `a` must be valid for reads of `n` elements.
pub unsafe fn scalar_sum_squares(a: *const f32, n: usize) -> f64 {
    let mut acc = 0.0f64;
    for i in 0..n {
        let x = *a.add(i) as f64;
        acc += x * x;
    }
    acc
}

/// The Reference Implementation.
///
/// # Safety
/// `a` must be valid for reads and writes of `n` elements.
pub unsafe fn scalar_divide(a: *mut f32, n: usize, divisor: f32) {
    for i in 0..n {
        *a.add(i) /= divisor;
    }
}

/// The AVX2 Intrinsic Kernel.
/// Widens 4 f32 lanes at a time to f64 and accumulates with Fused Multiply-Add (FMA).
///
/// # Safety
/// `a` must be valid for reads of `n` elements and the CPU must support AVX2+FMA.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
pub unsafe fn avx2_sum_squares(a: *const f32, n: usize) -> f64 {
    let mut acc0 = _mm256_setzero_pd();
    let mut acc1 = _mm256_setzero_pd();
    let mut acc2 = _mm256_setzero_pd();
    let mut acc3 = _mm256_setzero_pd();

    let mut i = 0;
    // 4 accumulators x 4 doubles per iteration
    while i + 16 <= n {
        let v0 = _mm256_cvtps_pd(_mm_loadu_ps(a.add(i)));
        acc0 = _mm256_fmadd_pd(v0, v0, acc0);

        let v1 = _mm256_cvtps_pd(_mm_loadu_ps(a.add(i + 4)));
        acc1 = _mm256_fmadd_pd(v1, v1, acc1);

        let v2 = _mm256_cvtps_pd(_mm_loadu_ps(a.add(i + 8)));
        acc2 = _mm256_fmadd_pd(v2, v2, acc2);

        let v3 = _mm256_cvtps_pd(_mm_loadu_ps(a.add(i + 12)));
        acc3 = _mm256_fmadd_pd(v3, v3, acc3);

        i += 16;
    }

    while i + 4 <= n {
        let v = _mm256_cvtps_pd(_mm_loadu_ps(a.add(i)));
        acc0 = _mm256_fmadd_pd(v, v, acc0);
        i += 4;
    }

    acc0 = _mm256_add_pd(acc0, acc1);
    acc2 = _mm256_add_pd(acc2, acc3);
    acc0 = _mm256_add_pd(acc0, acc2);

    // Horizontal sum to a single f64
    let upper = _mm256_extractf128_pd(acc0, 1);
    let lower = _mm256_castpd256_pd128(acc0);
    let sum128 = _mm_add_pd(upper, lower);
    let sum_h = _mm_hadd_pd(sum128, sum128);

    let mut result = _mm_cvtsd_f64(sum_h);

    // Tail (n % 4)
    while i < n {
        let x = *a.add(i) as f64;
        result += x * x;
        i += 1;
    }

    result
}

/// AVX2 in-place division. IEEE division is correctly rounded, so the output
/// is bit-identical to `scalar_divide`.
///
/// # Safety
/// `a` must be valid for reads and writes of `n` elements and the CPU must support AVX2.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn avx2_divide(a: *mut f32, n: usize, divisor: f32) {
    let d = _mm256_set1_ps(divisor);
    let mut i = 0;
    while i + 8 <= n {
        let v = _mm256_loadu_ps(a.add(i));
        _mm256_storeu_ps(a.add(i), _mm256_div_ps(v, d));
        i += 8;
    }
    while i < n {
        *a.add(i) /= divisor;
        i += 1;
    }
}

/// The pair of kernels a normalize run uses, chosen once per `Normalizer`.
#[derive(Debug, Clone, Copy)]
pub struct Kernels {
    sum_squares: SumSquaresFunc,
    divide: DivideFunc,
    name: &'static str,
}

impl Kernels {
    pub fn scalar() -> Self {
        Self { sum_squares: scalar_sum_squares, divide: scalar_divide, name: "scalar" }
    }

    /// The Dispatcher.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return Self { sum_squares: avx2_sum_squares, divide: avx2_divide, name: "avx2+fma" };
            }
        }

        Self::scalar()
    }

    pub fn select(choice: KernelChoice) -> Self {
        let kernels = match choice {
            KernelChoice::Auto => Self::detect(),
            KernelChoice::Scalar => Self::scalar(),
        };
        info!("Vector kernels: {}", kernels.name);
        kernels
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sum_squares(&self, segment: &[f32]) -> f64 {
        // SAFETY: the slice is valid for its length; the SIMD variant is only
        // selected after runtime feature detection.
        unsafe { (self.sum_squares)(segment.as_ptr(), segment.len()) }
    }

    pub fn divide(&self, segment: &mut [f32], divisor: f32) {
        // SAFETY: as in sum_squares, with exclusive access through &mut.
        unsafe { (self.divide)(segment.as_mut_ptr(), segment.len(), divisor) }
    }
}

impl Default for Kernels {
    fn default() -> Self {
        Self::detect()
    }
}
