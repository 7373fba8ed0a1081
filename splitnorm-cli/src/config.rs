use clap::Parser;
use splitnorm_core::{KernelChoice, NormalizeConfig, ThreadPolicy, ZeroNormPolicy};

/// Normalize a random vector of SIZE elements with THREADS worker threads.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Number of vector elements
    pub size: usize,

    /// Number of worker threads per phase
    pub threads: usize,

    /// Seed for the input generator (random if omitted)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Pin worker i to the i-th usable core
    #[arg(short, long)]
    pub pin: bool,

    /// mlock the input vector
    #[arg(short, long)]
    pub lock: bool,

    /// Fail instead of producing NaN for an all-zero vector
    #[arg(long)]
    pub reject_zero: bool,

    /// Clamp THREADS to SIZE instead of failing
    #[arg(long)]
    pub clamp: bool,

    /// Use the portable scalar kernels
    #[arg(long)]
    pub scalar: bool,

    /// Run the single-threaded reference instead
    #[arg(long)]
    pub sequential: bool,

    /// Print the vector before and after
    #[arg(long)]
    pub print: bool,
}

impl Args {
    pub fn normalize_config(&self) -> NormalizeConfig {
        NormalizeConfig::new(self.threads)
            .with_pinning(self.pin)
            .with_zero_norm(if self.reject_zero { ZeroNormPolicy::Reject } else { ZeroNormPolicy::Propagate })
            .with_thread_policy(if self.clamp { ThreadPolicy::Clamp } else { ThreadPolicy::Reject })
            .with_kernel(if self.scalar { KernelChoice::Scalar } else { KernelChoice::Auto })
    }
}
