use std::time::{Duration, Instant};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use splitnorm_core::datagen::generate_random_vector;
use splitnorm_core::{normalize_sequential, NormalizeConfig, Normalizer};
use splitnorm_io::SystemTopology;

mod histogram;

use histogram::LiveHistogram;

#[derive(Parser, Debug)]
#[command(author, version, about = "Thread-count sweep for two-phase normalization", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 1_000_000)]
    size: usize,

    /// Comma-separated thread counts (default: 1,2,4,... up to the usable cores)
    #[arg(short, long, value_delimiter = ',')]
    threads: Vec<usize>,

    #[arg(short, long, default_value_t = 20)]
    repeats: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(short, long)]
    pin: bool,
}

struct SweepRow {
    threads: usize,
    avg: Duration,
    p50_us: u64,
    p99_us: u64,
    max_norm_error: f64,
}

fn l2(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

fn average(total: Duration, repeats: usize) -> Duration {
    total.div_f64(repeats as f64)
}

fn default_thread_counts(cores: usize) -> Vec<usize> {
    let mut counts = vec![1];
    while counts[counts.len() - 1] * 2 <= cores {
        counts.push(counts[counts.len() - 1] * 2);
    }
    counts
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let topology = SystemTopology::new();
    let thread_counts = if args.threads.is_empty() {
        default_thread_counts(topology.suggested_threads())
    } else {
        args.threads.clone()
    };
    let repeats = args.repeats.max(1);

    println!("--- SPLITNORM THREAD SWEEP ---");
    println!("Size:          {}", args.size);
    println!("Threads:       {:?}", thread_counts);
    println!("Repeats:       {}", repeats);
    println!("Pinned:        {}", args.pin);
    println!("------------------------------\n");

    let mut rng = StdRng::seed_from_u64(args.seed);
    let input = generate_random_vector(args.size, &mut rng);

    // Sequential baseline
    let mut seq_total = Duration::ZERO;
    for _ in 0..repeats {
        let mut v = input.clone();
        let start = Instant::now();
        normalize_sequential(&mut v);
        seq_total += start.elapsed();
    }
    let seq_avg = average(seq_total, repeats);
    info!("Sequential baseline: {:.2?}", seq_avg);

    let mut rows = Vec::with_capacity(thread_counts.len());
    for &threads in &thread_counts {
        let normalizer = Normalizer::new(NormalizeConfig::new(threads).with_pinning(args.pin))?;
        let stats = LiveHistogram::new();
        let mut total = Duration::ZERO;
        let mut max_norm_error = 0.0f64;

        for _ in 0..repeats {
            let mut v = input.clone();
            let report = normalizer.normalize(&mut v)?;
            let elapsed = report.total_elapsed();
            stats.record(elapsed);
            total += elapsed;
            max_norm_error = max_norm_error.max((l2(&v) - 1.0).abs());
        }

        println!("[PROGRESS] {:>3} threads done", threads);
        rows.push(SweepRow {
            threads,
            avg: average(total, repeats),
            p50_us: stats.calculate_percentile(0.50),
            p99_us: stats.calculate_percentile(0.99),
            max_norm_error,
        });
    }

    println!("\n==================================================");
    println!("          SPLITNORM SWEEP RECEIPT                 ");
    println!("==================================================");
    println!(" Sequential:   {:.2?}", seq_avg);
    println!("--------------------------------------------------");
    println!(" {:>7} | {:>12} | {:>9} | {:>9} | {:>7} | {:>9}", "threads", "average", "p50<=us", "p99<=us", "speedup", "norm err");
    for row in &rows {
        println!(
            " {:>7} | {:>12.2?} | {:>9} | {:>9} | {:>6.2}x | {:>9.1e}",
            row.threads,
            row.avg,
            row.p50_us,
            row.p99_us,
            seq_avg.as_secs_f64() / row.avg.as_secs_f64().max(f64::MIN_POSITIVE),
            row.max_norm_error
        );
    }
    println!("==================================================\n");

    Ok(())
}
