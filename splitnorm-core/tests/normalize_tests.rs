use splitnorm_core::datagen::{generate_random_vector, seeded_rng};
use splitnorm_core::{
    normalize, normalize_sequential, CancelToken, KernelChoice, NormError, NormalizeConfig,
    Normalizer, Phase, ThreadPolicy, ZeroNormPolicy,
};
use splitnorm_io::AlignedVector;

fn l2(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= tol, "index {}: {} vs {} (tol {})", i, x, y, tol);
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_single_thread_three_four() {
    let mut v = vec![3.0f32, 4.0];
    let norm = normalize(&mut v, 1).unwrap();
    assert!((norm - 5.0).abs() < 1e-6);
    assert_close(&v, &[0.6, 0.8], 1e-6);
}

#[test]
fn test_two_threads_three_four() {
    let mut v = vec![3.0f32, 4.0];
    normalize(&mut v, 2).unwrap();
    assert_close(&v, &[0.6, 0.8], 1e-6);
}

#[test]
fn test_five_ones_two_threads() {
    let mut v = vec![1.0f32; 5];
    let report = Normalizer::new(NormalizeConfig::new(2)).unwrap().normalize(&mut v).unwrap();
    assert_eq!(report.sum_of_squares, 5.0);
    assert!((report.norm - 2.236).abs() < 1e-3);
    for x in &v {
        assert!((x - 0.447).abs() < 1e-3);
    }
}

#[test]
fn test_zero_vector_any_thread_count() {
    for threads in 1..=3 {
        let mut v = vec![0.0f32; 3];
        assert_eq!(normalize(&mut v, threads).unwrap(), 0.0);
        assert!(v.iter().all(|x| x.is_nan()), "threads={}", threads);

        let strict = NormalizeConfig::new(threads).with_zero_norm(ZeroNormPolicy::Reject);
        let mut v = vec![0.0f32; 3];
        assert!(matches!(
            Normalizer::new(strict).unwrap().normalize(&mut v),
            Err(NormError::ZeroNorm)
        ));
        assert_eq!(v, vec![0.0; 3]);
    }
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_output_has_unit_norm() {
    let mut rng = seeded_rng(Some(1234));
    for &len in &[1usize, 2, 7, 33, 100, 1000, 4097] {
        for &threads in &[1usize, 2, 3, 8] {
            if threads > len {
                continue;
            }
            let mut v = generate_random_vector(len, &mut rng);
            normalize(&mut v, threads).unwrap();
            let n = l2(&v);
            assert!((n - 1.0).abs() < 1e-5, "len={} threads={} norm={}", len, threads, n);
        }
    }
}

#[test]
fn test_unit_norm_at_extreme_magnitudes() {
    let mut rng = seeded_rng(Some(77));
    let input = generate_random_vector(1000, &mut rng);
    for scale in [1e-25f32, 1e20] {
        for threads in [1usize, 3, 8] {
            let mut v: Vec<f32> = input.iter().map(|x| x * scale).collect();
            let norm = normalize(&mut v, threads).unwrap();
            let n = l2(&v);
            assert!(norm.is_finite() && norm > 0.0, "scale={} norm={}", scale, norm);
            assert!((n - 1.0).abs() < 1e-5, "scale={} threads={} norm={}", scale, threads, n);
        }
    }
}

#[test]
fn test_thread_count_invariance() {
    let mut rng = seeded_rng(Some(99));
    let input = generate_random_vector(2500, &mut rng);

    let mut reference = input.clone();
    normalize(&mut reference, 1).unwrap();

    for threads in [2, 3, 4, 7, 16] {
        let mut v = input.clone();
        normalize(&mut v, threads).unwrap();
        assert_close(&v, &reference, 1e-5);
    }
}

#[test]
fn test_matches_sequential_reference() {
    let mut rng = seeded_rng(Some(5));
    let input = generate_random_vector(777, &mut rng);

    let mut seq = input.clone();
    normalize_sequential(&mut seq);

    let cfg = NormalizeConfig::new(5).with_kernel(KernelChoice::Scalar);
    let mut par = input.clone();
    Normalizer::new(cfg).unwrap().normalize(&mut par).unwrap();

    assert_close(&par, &seq, 1e-5);
}

#[test]
fn test_repeated_normalization_is_a_fixed_point() {
    let mut rng = seeded_rng(Some(2024));
    let mut v = generate_random_vector(513, &mut rng);
    normalize(&mut v, 4).unwrap();
    let once = v.clone();
    let norm = normalize(&mut v, 4).unwrap();
    assert!((norm - 1.0).abs() < 1e-5);
    assert_close(&v, &once, 1e-6);
}

#[test]
fn test_small_check_interval_gives_same_result() {
    let mut rng = seeded_rng(Some(3));
    let input = generate_random_vector(300, &mut rng);

    let mut a = input.clone();
    normalize(&mut a, 3).unwrap();

    let cfg = NormalizeConfig::new(3).with_check_interval(7);
    let mut b = input.clone();
    Normalizer::new(cfg).unwrap().normalize(&mut b).unwrap();

    assert_close(&a, &b, 1e-5);
}

// =============================================================================
// Preconditions and failure modes
// =============================================================================

#[test]
fn test_preconditions_rejected() {
    let mut empty: Vec<f32> = vec![];
    assert!(matches!(normalize(&mut empty, 1), Err(NormError::EmptyVector)));

    let mut v = vec![1.0f32, 2.0];
    assert!(matches!(normalize(&mut v, 0), Err(NormError::ZeroThreads)));
    let err = normalize(&mut v, 3).unwrap_err();
    assert!(err.is_precondition());
    assert!(matches!(err, NormError::TooManyThreads { threads: 3, len: 2 }));
    assert_eq!(v, vec![1.0, 2.0]);
}

#[test]
fn test_clamp_policy_for_short_vectors() {
    let cfg = NormalizeConfig::new(64).with_thread_policy(ThreadPolicy::Clamp);
    let mut v = vec![0.0f32, 5.0, 0.0];
    let report = Normalizer::new(cfg).unwrap().normalize(&mut v).unwrap();
    assert_eq!(report.threads, 3);
    assert_eq!(v, vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_caller_cancellation_reports_error() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut v = vec![2.0f32; 64];
    let err = Normalizer::new(NormalizeConfig::new(4))
        .unwrap()
        .normalize_with_cancel(&mut v, &cancel)
        .unwrap_err();
    assert!(matches!(err, NormError::Cancelled { phase: Phase::Reduce }));
    assert_eq!(v, vec![2.0; 64]);
}

// =============================================================================
// Platform integration
// =============================================================================

#[test]
fn test_aligned_buffer_with_pinned_workers() {
    let mut rng = seeded_rng(Some(8));
    let mut buf = AlignedVector::zeroed(10_000).unwrap();
    splitnorm_core::datagen::fill_random(&mut buf, &mut rng);

    let cfg = NormalizeConfig::new(4).with_pinning(true);
    let report = Normalizer::new(cfg).unwrap().normalize(&mut buf).unwrap();

    assert_eq!(report.threads, 4);
    assert!(report.norm > 0.0);
    assert!((l2(&buf) - 1.0).abs() < 1e-5);
}
