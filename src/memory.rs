//! Memory Accountant
//!
//! [`MemoryUsage`] is the numeric bookkeeping behind the two-tier budget:
//!
//! - **`capacity`**: soft budget. Admission below it is immediate; above it
//!   the cache first tries to evict reclaimable entries.
//! - **`max_size`**: hard budget. Content must never exceed it once an
//!   insertion completes.
//!
//! Budgets are configured in megabytes and converted with a decimal factor
//! (1 MB = 1,000,000 bytes). When `max_size` is below `capacity` the hard
//! budget also acts as the soft one, so no admission path can exceed it.

use core::fmt;

/// Bytes per configured megabyte.
pub const BYTES_PER_MB: u64 = 1_000_000;

/// Snapshot of the cache's budgets and current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Soft budget in bytes.
    pub capacity: u64,
    /// Hard budget in bytes.
    pub max_size: u64,
    /// Number of images currently cached.
    pub image_count: usize,
    /// Sum of the memory sizes of all cached images, in bytes.
    pub content_size: u64,
}

impl MemoryUsage {
    /// Creates an empty accountant with budgets given in bytes.
    pub fn new(capacity: u64, max_size: u64) -> Self {
        Self {
            capacity,
            max_size,
            image_count: 0,
            content_size: 0,
        }
    }

    /// Creates an empty accountant with budgets given in megabytes.
    pub fn from_megabytes(capacity_mb: u64, max_size_mb: u64) -> Self {
        Self::new(
            capacity_mb.saturating_mul(BYTES_PER_MB),
            max_size_mb.saturating_mul(BYTES_PER_MB),
        )
    }

    /// The soft budget actually enforced: `capacity`, capped by `max_size`.
    #[inline]
    pub fn soft_limit(&self) -> u64 {
        self.capacity.min(self.max_size)
    }

    /// True if `size` more bytes stay within the soft budget.
    #[inline]
    pub fn fits_capacity(&self, size: u64) -> bool {
        self.content_size.saturating_add(size) <= self.soft_limit()
    }

    /// True if `size` more bytes stay within the hard budget.
    #[inline]
    pub fn fits_max_size(&self, size: u64) -> bool {
        self.content_size.saturating_add(size) <= self.max_size
    }

    /// Bytes that must be freed before `size` more bytes fit the soft budget.
    ///
    /// Zero when they already fit.
    #[inline]
    pub fn missing_capacity(&self, size: u64) -> u64 {
        self.content_size
            .saturating_add(size)
            .saturating_sub(self.soft_limit())
    }

    /// Records an image of `size` bytes entering the cache.
    pub(crate) fn record_insertion(&mut self, size: u64) {
        self.image_count += 1;
        self.content_size += size;
    }

    /// Records an image of `size` bytes leaving the cache.
    pub(crate) fn record_eviction(&mut self, size: u64) {
        self.image_count -= 1;
        self.content_size -= size;
    }

    pub(crate) fn reset(&mut self) {
        self.image_count = 0;
        self.content_size = 0;
    }

    /// Content size relative to the hard budget (0.0 when the budget is 0).
    pub fn utilization(&self) -> f64 {
        if self.max_size > 0 {
            self.content_size as f64 / self.max_size as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory usage:")?;
        writeln!(f, " * capacity: {}", self.capacity)?;
        writeln!(f, " * max size: {}", self.max_size)?;
        writeln!(f, " * nb images: {}", self.image_count)?;
        write!(f, " * content size: {}", self.content_size)
    }
}
