use std::time::Instant;
use splitnorm_core::kernel::Kernels;

fn main() {
    let n = 4096; // One page of f32
    let iterations = 1_000_000;

    let v = vec![1.2f32; n];
    let scalar = Kernels::scalar();
    let detected = Kernels::detect();

    println!("Benchmarking sum of squares ({} iterations, n = {})...", iterations, n);
    let start_scalar = Instant::now();
    let mut sum_scalar = 0.0f64;
    for _ in 0..iterations {
        sum_scalar += scalar.sum_squares(std::hint::black_box(&v));
    }
    let duration_scalar = start_scalar.elapsed();
    println!("scalar: {:?} (Dummy sum: {})", duration_scalar, sum_scalar);

    let start_simd = Instant::now();
    let mut sum_simd = 0.0f64;
    for _ in 0..iterations {
        sum_simd += detected.sum_squares(std::hint::black_box(&v));
    }
    let duration_simd = start_simd.elapsed();
    println!("{}: {:?} (Dummy sum: {})", detected.name(), duration_simd, sum_simd);

    println!("\nBenchmarking in-place divide...");
    let mut buf = vec![1.2f32; n];
    let start_div = Instant::now();
    for _ in 0..iterations {
        // Divide by 1.0 so the buffer stays finite across iterations.
        detected.divide(std::hint::black_box(&mut buf), 1.0);
    }
    println!("{} divide: {:?}", detected.name(), start_div.elapsed());

    println!("\nSummary Speedup ({} vs scalar): {:.2}x",
        detected.name(),
        duration_scalar.as_secs_f64() / duration_simd.as_secs_f64());
}
