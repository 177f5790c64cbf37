//! Process-wide fixed-capacity pool of heap buffers that are zeroized on
//! release, on normal exit, and on any caught fatal signal.
//!
//! The pool's storage (`SLOTS`) is a fixed-size array of atomics so that
//! `zeroize_all` can run from a signal handler without allocating,
//! locking, or touching anything but plain fields and async-signal-safe
//! primitives (atomic loads and volatile writes). `acquire`/`release`
//! are the only operations that allocate or free; they are not meant to
//! be reentrant and are never called from signal context.

use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// At least 100 slots: enough to hold every secret the vault can have
/// live at once (passphrase, three derived keys, a generated password)
/// with headroom.
const CAPACITY: usize = 128;

struct Slot {
    ptr: AtomicPtr<u8>,
    len: AtomicUsize,
}

const EMPTY_SLOT: Slot = Slot {
    ptr: AtomicPtr::new(ptr::null_mut()),
    len: AtomicUsize::new(0),
};

static SLOTS: [Slot; CAPACITY] = [EMPTY_SLOT; CAPACITY];

unsafe fn zeroize_raw(ptr: *mut u8, len: usize) {
    if len == 0 {
        return;
    }
    slice::from_raw_parts_mut(ptr, len).zeroize();
}

/// Allocate `n` bytes, record them in the first free slot, and return the
/// raw parts. Used internally by `SensitiveBuffer::acquire`; exposed for
/// tests that want to exercise the pool directly.
fn acquire_raw(n: usize) -> Result<(*mut u8, usize)> {
    let mut v = vec![0u8; n];
    let ptr = v.as_mut_ptr();
    std::mem::forget(v);

    for slot in SLOTS.iter() {
        if slot
            .ptr
            .compare_exchange(ptr::null_mut(), ptr, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            slot.len.store(n, Ordering::Release);
            return Ok((ptr, n));
        }
    }

    // No free slot: the allocation above was never recorded in the pool,
    // so reclaim and wipe it ourselves before failing fatally.
    unsafe {
        zeroize_raw(ptr, n);
        drop(Vec::from_raw_parts(ptr, n, n));
    }
    Err(Error::internal("sensitive buffer pool exhausted"))
}

/// Zeroize, free, and free the slot for a pointer previously returned by
/// `acquire_raw`. Fails fatally (as an internal error) if `ptr` was not
/// recorded — that would mean a double release or a pointer this pool
/// never allocated.
fn release_raw(ptr: *mut u8) -> Result<()> {
    for slot in SLOTS.iter() {
        if slot.ptr.load(Ordering::Acquire) == ptr {
            let len = slot.len.load(Ordering::Acquire);
            unsafe {
                zeroize_raw(ptr, len);
                drop(Vec::from_raw_parts(ptr, len, len));
            }
            slot.ptr.store(ptr::null_mut(), Ordering::Release);
            slot.len.store(0, Ordering::Release);
            return Ok(());
        }
    }
    Err(Error::internal("release of untracked sensitive buffer"))
}

/// Zero every occupied slot's bytes without freeing them. Safe to call
/// from a signal handler: only atomic loads and volatile writes, no
/// allocation, no locking. Invoked from the fatal-signal handler and
/// from the normal-exit termination hook.
pub fn zeroize_all() {
    for slot in SLOTS.iter() {
        let ptr = slot.ptr.load(Ordering::Acquire);
        let len = slot.len.load(Ordering::Acquire);
        if !ptr.is_null() {
            unsafe { zeroize_raw(ptr, len) };
        }
    }
}

/// Byte-compare `a` and `b` in time independent of the first differing
/// index. Panics if the lengths differ — callers compare fixed-size
/// secret fields, so a length mismatch is a programming error.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    assert_eq!(a.len(), b.len(), "constant_time_eq: length mismatch");
    a.ct_eq(b).into()
}

/// Request that the process's entire virtual address space be locked
/// against paging, so secrets are never written to swap. Failure (most
/// commonly an insufficient `RLIMIT_MEMLOCK`) is logged and otherwise
/// ignored — the core does not attempt privilege elevation to fix it.
pub fn lock_memory() {
    #[cfg(unix)]
    {
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc != 0 {
            tracing::warn!(
                errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0),
                "mlockall failed; secrets may be swappable on this system"
            );
        }
    }
}

/// RAII handle to a pool-tracked heap buffer. Zeroized and released when
/// dropped, on every path including error unwinding.
pub struct SensitiveBuffer {
    ptr: *mut u8,
    len: usize,
}

impl SensitiveBuffer {
    pub fn acquire(n: usize) -> Result<Self> {
        let (ptr, len) = acquire_raw(n)?;
        Ok(Self { ptr, len })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = Self::acquire(bytes.len())?;
        buf.as_mut_slice().copy_from_slice(bytes);
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for SensitiveBuffer {
    fn drop(&mut self) {
        // release_raw only fails if the pointer was never recorded, which
        // cannot happen for a buffer this handle itself acquired.
        let _ = release_raw(self.ptr);
    }
}
