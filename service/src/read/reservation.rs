//! [`Reservation`] read model definitions.

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{reservation::Status, Reservation};

/// Wrapper around [`Reservation`]s indicating that only the ones in an
/// [occupying] [`Status`] are selected.
///
/// [occupying]: Status::is_occupying
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Occupying<T>(pub T);

/// Selector of the [`Reservation`]s booked by a tutor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OfTutor(pub user::Id);

/// Selector of the [`Reservation`]s of a host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OfHost(pub user::Id);
