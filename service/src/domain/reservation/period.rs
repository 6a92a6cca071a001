//! [`Period`] definitions.

use common::Date;
use derive_more::Display;

/// Half-open range of calendar days `[start, end)` of a stay.
///
/// `start` is always strictly before `end`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("[{start}, {end})")]
pub struct Period {
    /// First day of the stay.
    start: Date,

    /// Day the stay ends, exclusive.
    end: Date,
}

impl Period {
    /// Creates a new [`Period`], if `start` is before `end`.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Returns the first day of this [`Period`].
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Returns the day this [`Period`] ends, exclusive.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Returns the number of days in this [`Period`], always positive.
    #[must_use]
    pub fn days(&self) -> u32 {
        u32::try_from(self.start.days_until(self.end)).unwrap_or(u32::MAX)
    }

    /// Indicates whether this [`Period`] intersects with the `other` one.
    ///
    /// Touching periods (one ending on the day the other starts) don't
    /// intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Indicates whether the provided `day` is within this [`Period`].
    #[must_use]
    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day < self.end
    }
}
