use core::fmt;

/// Opaque identifier for a visual object.
///
/// Unique only while live. Released handles are recycled by [`HandleAllocator`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle(u32);

impl Handle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues and recycles small integer handles.
///
/// Freed handles are reused LIFO (most recently released first); otherwise the
/// next never-issued integer is returned. Releasing does not invalidate copies
/// of the handle value held elsewhere.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: u32,
    free: Vec<Handle>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> Handle {
        if let Some(h) = self.free.pop() {
            return h;
        }

        let h = Handle(self.next);
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| unreachable!("visual handle space exhausted"));
        h
    }

    pub fn release(&mut self, handle: Handle) {
        debug_assert!(handle.0 < self.next, "releasing a handle that was never issued: {handle}");
        debug_assert!(!self.free.contains(&handle), "double release of {handle}");
        self.free.push(handle);
    }

    /// Number of handles currently issued and not released.
    pub fn live_count(&self) -> usize {
        self.next as usize - self.free.len()
    }
}
