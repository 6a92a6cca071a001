//! [`Review`] read model definitions.

use crate::domain::user;
#[cfg(doc)]
use crate::domain::Review;

/// Selector of the [`Review`]s written about a user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct About(pub user::Id);
