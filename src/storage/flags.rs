//! Bit-packed edge properties: direction bits plus a speed category.

use std::fmt;

use serde::Serialize;

const FORWARD: u32 = 1;
const BACKWARD: u32 = 2;
const BOTH: u32 = FORWARD | BACKWARD;
const DIRECTION_MASK: u32 = BOTH;
const SPEED_SHIFT: u32 = 2;

/// Speeds are stored divided by this factor.
pub const SPEED_FACTOR: u32 = 2;

/// Speed used by [`EdgeFlags::default_car`].
pub const DEFAULT_SPEED_KMH: u32 = 50;

/// Edge flags as stored in the edge record.
///
/// Direction bits are relative to the edge's canonical orientation (lower node
/// id first). Views oriented from the higher endpoint see them swapped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EdgeFlags(pub u32);

impl EdgeFlags {
    /// Flags for a road of `speed_kmh`, one-way (base to adjacent) unless `both`.
    pub const fn new(speed_kmh: u32, both: bool) -> Self {
        let dir = if both { BOTH } else { FORWARD };
        EdgeFlags(((speed_kmh / SPEED_FACTOR) << SPEED_SHIFT) | dir)
    }

    /// Default car road at [`DEFAULT_SPEED_KMH`].
    pub const fn default_car(both: bool) -> Self {
        Self::new(DEFAULT_SPEED_KMH, both)
    }

    /// Travel allowed from base to adjacent node.
    pub const fn is_forward(self) -> bool {
        self.0 & FORWARD != 0
    }

    /// Travel allowed from adjacent to base node.
    pub const fn is_backward(self) -> bool {
        self.0 & BACKWARD != 0
    }

    /// Travel allowed in both directions.
    pub const fn is_both(self) -> bool {
        self.0 & DIRECTION_MASK == BOTH
    }

    /// Stored speed part (speed divided by [`SPEED_FACTOR`]).
    pub const fn speed_part(self) -> u32 {
        self.0 >> SPEED_SHIFT
    }

    /// Speed in km/h.
    pub const fn speed_kmh(self) -> u32 {
        self.speed_part() * SPEED_FACTOR
    }

    /// Flags as seen from the other endpoint. Bidirectional and direction-less
    /// edges are unchanged; one-way edges flip forward and backward.
    pub const fn swap_direction(self) -> Self {
        let dir = self.0 & DIRECTION_MASK;
        if dir == BOTH || dir == 0 {
            self
        } else {
            EdgeFlags(self.0 ^ DIRECTION_MASK)
        }
    }

    #[inline]
    pub(crate) fn raw(self) -> i32 {
        self.0 as i32
    }

    #[inline]
    pub(crate) fn from_raw(raw: i32) -> Self {
        EdgeFlags(raw as u32)
    }
}

impl fmt::Debug for EdgeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match (self.is_forward(), self.is_backward()) {
            (true, true) => "both",
            (true, false) => "fwd",
            (false, true) => "bwd",
            (false, false) => "none",
        };
        write!(f, "EdgeFlags({dir}, {}km/h)", self.speed_kmh())
    }
}
