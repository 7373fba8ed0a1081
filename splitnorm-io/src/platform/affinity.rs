use std::mem;
use log::{debug, warn};

/// Pins the current thread to a specific CPU core.
///
/// # Logic
/// Uses `libc::sched_setaffinity` to restrict the OS scheduler for this thread
/// to a single bit in the CPU mask. A worker pinned for the reduction phase keeps
/// its segment warm in the core-local caches, and the scaling worker with the
/// same index lands on the same core for the second pass over that segment.
///
/// # Safety
/// This function performs an FFI call to `sched_setaffinity`.
/// It relies on `libc::cpu_set_t` layout being correct for the target OS.
///
/// # Errors
/// Returns `false` and logs a warning if pinning fails (e.g., core index out of bounds).
/// It does NOT panic, allowing the worker to run "floating" if affinity is impossible.
pub fn pin_thread_to_core(core_id: usize) -> bool {
    if core_id >= libc::CPU_SETSIZE as usize {
        warn!("Core {} exceeds CPU_SETSIZE. Worker running floating.", core_id);
        return false;
    }

    let mut cpu_set: libc::cpu_set_t = unsafe { mem::zeroed() };

    // SAFETY: core_id was bounds-checked against CPU_SETSIZE above.
    unsafe {
        libc::CPU_ZERO(&mut cpu_set);
        libc::CPU_SET(core_id, &mut cpu_set);
    }

    let pid = 0; // 0 means the calling thread

    // SAFETY:
    // - `pid` 0 refers to current thread.
    // - `cpu_set` is stack-allocated and valid.
    // - `sizeof(cpu_set_t)` is correct.
    let ret = unsafe {
        libc::sched_setaffinity(pid, mem::size_of::<libc::cpu_set_t>(), &cpu_set)
    };

    if ret != 0 {
        let err = std::io::Error::last_os_error();
        warn!("Failed to pin thread to core {}. Error: {} (Running floating)", core_id, err);
        return false;
    }

    debug!("Thread {:?} pinned to core {}", std::thread::current().name(), core_id);
    true
}
