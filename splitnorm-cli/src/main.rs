use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use splitnorm_core::datagen::{fill_random, seeded_rng};
use splitnorm_core::{normalize_sequential, CancelToken, Normalizer};
use splitnorm_io::platform::lock_memory_pages;
use splitnorm_io::{AlignedVector, SystemTopology};
use std::time::Instant;

mod config;

use config::Args;

fn print_vector(vector: &[f32]) {
    let body: Vec<String> = vector.iter().map(|x| format!("{:.6}", x)).collect();
    println!("[ {} ]", body.join(" "));
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.size == 0 {
        bail!("SIZE must be at least 1");
    }

    // 1. Interrogate Hardware
    let topology = SystemTopology::new();
    if !topology.fits_in_memory(args.size) {
        log::warn!("{} elements exceed available RAM; expect swapping.", args.size);
    }
    if args.threads > topology.suggested_threads() {
        info!("{} threads oversubscribe {} usable cores.", args.threads, topology.suggested_threads());
    }

    // 2. Build the input
    let mut vector = AlignedVector::zeroed(args.size).context("Failed to allocate vector")?;
    fill_random(&mut vector, &mut seeded_rng(args.seed));
    if args.lock {
        lock_memory_pages();
        vector.lock();
    }

    let normalizer = Normalizer::new(args.normalize_config()).context("Invalid configuration")?;

    // 3. Ctrl-C cancels the run between chunks
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).context("Failed to install Ctrl-C handler")?;
    }

    println!("Starting...\tSize = {}\tnThreads = {}", args.size, args.threads);
    if args.print {
        print!("Random vector: \t");
        print_vector(&vector);
    }

    let start = Instant::now();
    if args.sequential {
        let norm = normalize_sequential(&mut vector);
        info!("Sequential norm: {}", norm);
    } else {
        let report = normalizer
            .normalize_with_cancel(&mut vector, &cancel)
            .context("Normalization failed")?;
        info!(
            "Norm {} over {} threads (reduce {:?}, scale {:?}, kernel {})",
            report.norm,
            report.threads,
            report.reduce_elapsed,
            report.scale_elapsed,
            normalizer.kernels().name()
        );
    }
    let elapsed = start.elapsed();

    if args.print {
        print!("Result vector: \t");
        print_vector(&vector);
    }

    println!("Time: \t {:.6} msecs ", elapsed.as_secs_f64() * 1000.0);
    println!("Exit");
    Ok(())
}
