pub mod affinity;
pub mod topology;

/// Locks the pages currently mapped by the process into physical RAM.
///
/// # Logic
/// Calls `mlockall(MCL_CURRENT)` so that a large input vector allocated before
/// the call cannot be swapped out between the reduction and scaling phases.
/// `MCL_FUTURE` is not requested: allocating beyond `ulimit -l` afterwards
/// would then fail outright.
///
/// Returns `false` (after logging) when the OS refuses the lock.
pub fn lock_memory_pages() -> bool {
    // SAFETY: FFI call to mlockall with valid flags.
    let ret = unsafe { libc::mlockall(libc::MCL_CURRENT) };

    if ret != 0 {
        let err = std::io::Error::last_os_error();
        log::warn!("Failed to lock memory pages (mlockall): {}.", err);
        log::warn!("Fix: Run 'ulimit -l unlimited' or run with capability CAP_IPC_LOCK.");
        return false;
    }
    true
}
