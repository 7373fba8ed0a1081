use crate::error::{NormError, Result};

/// Elements a worker processes between two cancellation checks.
pub const DEFAULT_CHECK_INTERVAL: usize = 64 * 1024;

/// What to do when the thread count exceeds the vector length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadPolicy {
    /// Fail with `TooManyThreads` before spawning anything.
    #[default]
    Reject,
    /// Run with `min(threads, len)` workers.
    Clamp,
}

/// What to do when the reduction yields a zero norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroNormPolicy {
    /// Divide anyway: every element becomes NaN (0/0).
    #[default]
    Propagate,
    /// Fail with `ZeroNorm` and leave the vector untouched.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelChoice {
    /// Best kernel the CPU supports.
    #[default]
    Auto,
    /// Portable scalar loops only.
    Scalar,
}

/// Settings fixed for the lifetime of a `Normalizer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeConfig {
    pub threads: usize,
    pub thread_policy: ThreadPolicy,
    pub zero_norm: ZeroNormPolicy,
    pub kernel: KernelChoice,
    /// Pin worker `i` to the `i`-th usable core (round-robin).
    pub pin_workers: bool,
    pub check_interval: usize,
}

impl NormalizeConfig {
    pub fn new(threads: usize) -> Self {
        Self { threads, ..Self::default() }
    }

    pub fn with_thread_policy(mut self, policy: ThreadPolicy) -> Self {
        self.thread_policy = policy;
        self
    }

    pub fn with_zero_norm(mut self, policy: ZeroNormPolicy) -> Self {
        self.zero_norm = policy;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelChoice) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_pinning(mut self, pin: bool) -> Self {
        self.pin_workers = pin;
        self
    }

    pub fn with_check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval;
        self
    }

    /// # Errors
    /// `ZeroThreads` for `threads == 0`, `Config` for a zero check interval.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(NormError::ZeroThreads);
        }
        if self.check_interval == 0 {
            return Err(NormError::Config("check_interval must be at least 1".into()));
        }
        Ok(())
    }

    /// Worker count for a vector of `len` elements under `thread_policy`.
    pub fn effective_threads(&self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(NormError::EmptyVector);
        }
        if self.threads <= len {
            return Ok(self.threads);
        }
        match self.thread_policy {
            ThreadPolicy::Reject => Err(NormError::TooManyThreads { threads: self.threads, len }),
            ThreadPolicy::Clamp => {
                log::warn!("Clamping {} threads to vector length {}", self.threads, len);
                Ok(len)
            }
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            thread_policy: ThreadPolicy::default(),
            zero_norm: ZeroNormPolicy::default(),
            kernel: KernelChoice::default(),
            pin_workers: false,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}
