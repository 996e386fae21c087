//! Rack-unit geometry.
//!
//! A rack is a column of [`U_MAX`] discrete units numbered bottom-up from 1.
//! A device of height `h` sitting at start unit `s` occupies the closed
//! interval `[s, s + h - 1]`.
//!
//! [`intervals_overlap`] is the only collision test in the crate.  Both
//! auto-placement and move validation call it, so a move can never produce an
//! arrangement that placement would have refused.

/// Height of the rack in units.  Fixed for the lifetime of a layout.
pub const U_MAX: u32 = 42;

/// Returns `true` if the closed unit intervals `[start_a, start_a + height_a - 1]`
/// and `[start_b, start_b + height_b - 1]` share at least one unit.
///
/// For integer intervals `a1 ≤ b2 ∧ b1 ≤ a2` is the same as
/// `a1 < b1 + hb ∧ b1 < a1 + ha`, which is what is evaluated here so that a
/// zero height can never underflow.  A zero-height interval overlaps nothing.
pub fn intervals_overlap(start_a: u32, height_a: u32, start_b: u32, height_b: u32) -> bool {
    start_a < start_b.saturating_add(height_b) && start_b < start_a.saturating_add(height_a)
}

/// Returns `true` if a device of `height` units starting at `start` lies
/// entirely inside `[1, U_MAX]`.
pub fn fits_in_rack(start: u32, height: u32) -> bool {
    start >= 1 && height >= 1 && start.saturating_add(height - 1) <= U_MAX
}

/// The highest legal start unit for a device of `height` units, or `None`
/// when the device cannot fit in the rack at all.
pub fn highest_start(height: u32) -> Option<u32> {
    if height == 0 || height > U_MAX {
        None
    } else {
        Some(U_MAX - height + 1)
    }
}

/// A contiguous run of rack units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRange {
    /// Bottom-most unit (1-based).
    pub start: u32,
    /// Number of units covered.
    pub height: u32,
}

impl SlotRange {
    pub fn new(start: u32, height: u32) -> Self {
        Self { start, height }
    }

    /// Returns the top-most unit covered (inclusive).
    ///
    /// For a zero-height range this is one below `start`.
    pub fn top(&self) -> u32 {
        (self.start + self.height).saturating_sub(1)
    }

    /// Returns `true` if `unit` falls inside this range.
    pub fn contains(&self, unit: u32) -> bool {
        self.height > 0 && unit >= self.start && unit <= self.top()
    }

    /// Returns `true` if this range shares a unit with `other`.
    pub fn overlaps(&self, other: &SlotRange) -> bool {
        intervals_overlap(self.start, self.height, other.start, other.height)
    }

    /// Returns `true` if the whole range lies inside the rack.
    pub fn fits_in_rack(&self) -> bool {
        fits_in_rack(self.start, self.height)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
