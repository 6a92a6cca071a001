//! [`Host`] read model definitions.

#[cfg(doc)]
use crate::domain::Host;

/// Selector of the [`Host`]s accepting new reservations.
///
/// [`Host::is_bookable()`] holds for every selected [`Host`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bookable;
