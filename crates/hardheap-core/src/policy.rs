//! Runtime policy toggles.
//!
//! Debug checking, allocation-site tracking, zero-on-free, and the integrity
//! check level are all process-wide switches. They are modelled as typed
//! values here; the C surface converts from raw integers at the boundary.

use crate::log::{LogSink, stderr_sink};

/// How much of a freed region is overwritten with zero bytes before the
/// memory returns to the free pool.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ZeroDepth {
    /// Do not zero.
    #[default]
    None,
    /// Zero the first `shallow_zero_size` bytes.
    Shallow,
    /// Zero half of the user region.
    Medium,
    /// Zero the entire user region.
    Deep,
}

impl ZeroDepth {
    /// Converts a raw depth. Invalid values reset to `None`.
    #[must_use]
    pub fn from_raw(depth: i32) -> Self {
        match depth {
            1 => Self::Shallow,
            2 => Self::Medium,
            3 => Self::Deep,
            _ => Self::None,
        }
    }

    /// Bytes to zero for a user region of `user_size` bytes.
    #[must_use]
    pub fn span(self, user_size: usize, shallow_size: usize) -> usize {
        match self {
            Self::None => 0,
            Self::Shallow => shallow_size.min(user_size),
            Self::Medium => user_size / 2,
            Self::Deep => user_size,
        }
    }
}

/// Segment verification depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// No verification.
    Off,
    /// Magic sentinel and size plausibility only.
    Basic,
    /// Plus header guard and metadata checksum.
    Standard,
    /// Plus footer guard, back-pointer symmetry, and heap bounds.
    Thorough,
}

impl CheckLevel {
    /// Converts a raw level. Out-of-range values are rejected.
    #[must_use]
    pub fn from_raw(level: i32) -> Option<Self> {
        match level {
            0 => Some(Self::Off),
            1 => Some(Self::Basic),
            2 => Some(Self::Standard),
            3 => Some(Self::Thorough),
            _ => None,
        }
    }

    /// True when this level performs at least the checks of `other`.
    #[must_use]
    pub const fn includes(self, other: Self) -> bool {
        self as u8 >= other as u8
    }
}

impl Default for CheckLevel {
    fn default() -> Self {
        Self::Basic
    }
}

/// The full set of runtime toggles, guarded by the allocator mutex.
pub struct RuntimePolicy {
    /// Enables corruption checks on the hot paths and log emission.
    pub debug_mode: bool,
    /// Enables allocation-site recording for tracked allocations.
    pub track_allocations: bool,
    /// Advisory flag mirrored from `HeapEnableThreadSafety`. The state lock
    /// is unconditional; this only changes what the status report says.
    pub thread_safety: bool,
    /// Zero-on-free depth.
    pub zero_depth: ZeroDepth,
    /// Byte count for the shallow zeroing depth.
    pub shallow_zero_size: usize,
    /// Segment verification depth.
    pub check_level: CheckLevel,
    /// Destination for diagnostic output.
    pub log_sink: LogSink,
}

impl RuntimePolicy {
    /// Policy at process start: no debugging, no zeroing, basic checks,
    /// 64-byte shallow span, stderr sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            track_allocations: false,
            thread_safety: false,
            zero_depth: ZeroDepth::None,
            shallow_zero_size: 64,
            check_level: CheckLevel::Basic,
            log_sink: stderr_sink,
        }
    }

    /// Human-readable label for the current zero-on-free depth.
    #[must_use]
    pub fn zero_depth_label(&self) -> &'static str {
        match self.zero_depth {
            ZeroDepth::None => "none (best performance)",
            ZeroDepth::Shallow => "shallow (headers/pointers only)",
            ZeroDepth::Medium => "medium (50% of memory)",
            ZeroDepth::Deep => "deep (entire memory block)",
        }
    }
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self::new()
    }
}
