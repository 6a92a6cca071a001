//! [`Clock`] definitions.

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use common::Date;

/// Source of the current calendar [`Date`].
pub trait Clock {
    /// Returns the current [`Date`].
    fn today(&self) -> Date;
}

/// [`Clock`] reading the system time in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct System;

impl Clock for System {
    fn today(&self) -> Date {
        Date::today()
    }
}

/// [`Clock`] standing still at a settable [`Date`].
///
/// Clones share the same [`Date`]. Only whole [`Date`]s are ever stored, so
/// [`Fixed::today()`] always reads a valid one back.
#[derive(Clone, Debug)]
pub struct Fixed(Arc<AtomicI32>);

impl Fixed {
    /// Creates a new [`Fixed`] clock at the provided [`Date`].
    #[must_use]
    pub fn new(today: Date) -> Self {
        Self(Arc::new(AtomicI32::new(today.to_julian_day())))
    }

    /// Moves this [`Fixed`] clock to the provided [`Date`].
    pub fn set(&self, today: Date) {
        self.0.store(today.to_julian_day(), Ordering::Release);
    }
}

impl Clock for Fixed {
    fn today(&self) -> Date {
        Date::from_julian_day(self.0.load(Ordering::Acquire))
            .expect("only valid `Date`s are stored")
    }
}
