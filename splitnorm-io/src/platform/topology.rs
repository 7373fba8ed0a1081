use log::{warn, info};

/// Hardware Topology Detector.
/// Identifies the cores worker threads may be placed on.
pub struct SystemTopology {
    core_ids: Vec<usize>,
    available_ram: u64,
}

impl SystemTopology {
    /// Detects the system's core and memory configuration.
    ///
    /// # Logic
    /// Prefers `core_affinity::get_core_ids`, which honours the process
    /// affinity mask (cgroups, `taskset`). Falls back to `sysconf` and then to a
    /// single core so that detection never fails.
    pub fn new() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        let av_pages = unsafe { libc::sysconf(libc::_SC_AVPHYS_PAGES) };
        let available_ram = if page_size > 0 && av_pages > 0 {
            page_size as u64 * av_pages as u64
        } else {
            0
        };

        let core_ids: Vec<usize> = match core_affinity::get_core_ids() {
            Some(ids) if !ids.is_empty() => ids.into_iter().map(|c| c.id).collect(),
            _ => {
                let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
                if count <= 0 {
                    warn!("Failed to detect core count. Fallback to 1.");
                    vec![0]
                } else {
                    (0..count as usize).collect()
                }
            }
        };

        info!("Topology Discovery: {} usable cores, {:.2} GB RAM available.",
            core_ids.len(),
            available_ram as f64 / 1e9
        );

        Self { core_ids, available_ram }
    }

    /// Builds a topology from a fixed core list (tests, explicit placement).
    pub fn from_cores(core_ids: Vec<usize>) -> Self {
        let core_ids = if core_ids.is_empty() { vec![0] } else { core_ids };
        Self { core_ids, available_ram: 0 }
    }

    /// Returns the IDs of the cores this process may run on. Never empty.
    pub fn core_ids(&self) -> &[usize] {
        &self.core_ids
    }

    /// Returns the available RAM in bytes (0 if unknown).
    pub fn available_ram(&self) -> u64 {
        self.available_ram
    }

    /// Thread count that saturates the usable cores without oversubscribing.
    pub fn suggested_threads(&self) -> usize {
        self.core_ids.len()
    }

    /// Core assigned to worker `index` when workers are pinned round-robin.
    pub fn core_for_worker(&self, index: usize) -> usize {
        self.core_ids[index % self.core_ids.len()]
    }

    /// Whether a vector of `len` f32 elements fits in available RAM.
    /// Unknown RAM is treated as "fits".
    pub fn fits_in_memory(&self, len: usize) -> bool {
        let bytes = (len as u64).saturating_mul(std::mem::size_of::<f32>() as u64);
        self.available_ram == 0 || bytes <= self.available_ram
    }
}

impl Default for SystemTopology {
    fn default() -> Self {
        Self::new()
    }
}
