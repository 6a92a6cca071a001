//! [`Query`] collection related to multiple [`Reservation`]s.

use common::operations::By;

use crate::{domain::Reservation, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all the [`Reservation`]s booked by a tutor, the most recent first.
pub type OfTutor = DatabaseQuery<By<Vec<Reservation>, read::reservation::OfTutor>>;

/// Queries all the [`Reservation`]s of a host, the most recent first.
pub type OfHost = DatabaseQuery<By<Vec<Reservation>, read::reservation::OfHost>>;
