use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Deref, DerefMut};
use libc::{c_void, mlock, munlock};
use thiserror::Error;
use log::{info, warn};

/// Alignment of every vector buffer. Keeps segment starts for common
/// power-of-two splits on page and cache-line boundaries.
pub const PAGE_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Cannot allocate an empty vector")]
    Empty,
    #[error("Vector of {0} elements overflows the address space")]
    TooLarge(usize),
    #[error("Failed to allocate {0} bytes of aligned memory")]
    AllocationFailed(usize),
}

/// A contiguous, page-aligned `f32` buffer.
///
/// Owns the vector for the whole normalize call; workers only see the
/// disjoint sub-slices handed out by the partitioner. Optionally pinned in
/// physical RAM via `mlock`.
pub struct AlignedVector {
    ptr: *mut f32,
    len: usize,
    layout: Layout,
    locked: bool,
}

// SAFETY: AlignedVector uniquely owns its allocation, like Vec<f32>.
unsafe impl Send for AlignedVector {}
unsafe impl Sync for AlignedVector {}

impl AlignedVector {
    /// Allocates `len` zeroed elements aligned to `PAGE_SIZE`.
    ///
    /// # Errors
    /// `Empty` for `len == 0`, `TooLarge` if the byte size overflows, and
    /// `AllocationFailed` if the allocator returns null.
    pub fn zeroed(len: usize) -> Result<Self, MemoryError> {
        if len == 0 {
            return Err(MemoryError::Empty);
        }
        let bytes = len
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or(MemoryError::TooLarge(len))?;
        let layout = Layout::from_size_align(bytes, PAGE_SIZE)
            .map_err(|_| MemoryError::TooLarge(len))?;

        // SAFETY: layout has non-zero size (len > 0).
        let ptr = unsafe { alloc_zeroed(layout) } as *mut f32;
        if ptr.is_null() {
            return Err(MemoryError::AllocationFailed(bytes));
        }

        Ok(Self { ptr, len, layout, locked: false })
    }

    /// Copies `values` into a fresh aligned buffer.
    pub fn from_slice(values: &[f32]) -> Result<Self, MemoryError> {
        let mut v = Self::zeroed(values.len())?;
        v.copy_from_slice(values);
        Ok(v)
    }

    /// Pins the buffer in physical RAM. Returns whether the lock succeeded.
    ///
    /// A refused lock (usually `ulimit -l`) is logged and otherwise ignored:
    /// the buffer stays usable, it may merely be swapped.
    pub fn lock(&mut self) -> bool {
        if self.locked {
            return true;
        }
        // SAFETY: ptr/size describe the live allocation made in zeroed().
        self.locked = unsafe { mlock(self.ptr as *const c_void, self.layout.size()) == 0 };
        if self.locked {
            info!("Pinned {} bytes of vector memory", self.layout.size());
        } else {
            warn!("mlock refused for {} bytes: {}", self.layout.size(), std::io::Error::last_os_error());
        }
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn as_slice(&self) -> &[f32] {
        // SAFETY: ptr is valid for len initialized (zeroed) f32s for the lifetime of self.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Deref for AlignedVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl DerefMut for AlignedVector {
    fn deref_mut(&mut self) -> &mut [f32] {
        self.as_mut_slice()
    }
}

impl Drop for AlignedVector {
    fn drop(&mut self) {
        // SAFETY: munlock only on a region we locked; dealloc with the allocation layout.
        unsafe {
            if self.locked {
                munlock(self.ptr as *const c_void, self.layout.size());
            }
            dealloc(self.ptr as *mut u8, self.layout);
        }
    }
}

impl std::fmt::Debug for AlignedVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedVector")
            .field("len", &self.len)
            .field("locked", &self.locked)
            .finish()
    }
}
