//! Handles
//!
//! Opaque 32-bit identifiers for sessions, leases, cue-sheet registrations
//! and rented players. Counters wrap back to [`HANDLE_RESTART`] instead of
//! overflowing; a handle may be reused after a full wrap, which is accepted
//! at the lifetimes this runtime targets.

use std::fmt;

/// Reserved, never issued
pub const INVALID_HANDLE: u32 = 0;

/// First value issued, and the value counters wrap back to
pub const HANDLE_RESTART: u32 = 1;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(&self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(&self) -> bool {
                self.0 != INVALID_HANDLE
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// An open cue session
    SessionHandle,
    "session"
);
define_handle!(
    /// One in-flight playback instance
    LeaseHandle,
    "lease"
);
define_handle!(
    /// A reference-counted cue-sheet registration
    CueSheetHandle,
    "cue-sheet"
);
define_handle!(
    /// A player rented outside the lease lifecycle
    UnmanagedPlayerHandle,
    "player"
);

/// Monotonic wrapping counter
#[derive(Debug, Clone)]
pub(crate) struct HandleCounter {
    next: u32,
}

impl HandleCounter {
    pub(crate) fn new() -> Self {
        Self {
            next: HANDLE_RESTART,
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub(crate) fn next_raw(&mut self) -> u32 {
        let id = self.next;
        self.next = if self.next == u32::MAX {
            HANDLE_RESTART
        } else {
            self.next + 1
        };
        id
    }
}

impl Default for HandleCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let mut counter = HandleCounter::new();
        assert_eq!(counter.next_raw(), 1);
        assert_eq!(counter.next_raw(), 2);
        assert_eq!(counter.next_raw(), 3);
    }

    #[test]
    fn test_counter_wraps_to_restart() {
        let mut counter = HandleCounter::starting_at(u32::MAX - 1);
        assert_eq!(counter.next_raw(), u32::MAX - 1);
        assert_eq!(counter.next_raw(), u32::MAX);
        assert_eq!(counter.next_raw(), HANDLE_RESTART);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(SessionHandle::from_raw(7).to_string(), "session#7");
        assert!(!LeaseHandle::from_raw(INVALID_HANDLE).is_valid());
    }
}
