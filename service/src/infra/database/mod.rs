//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint allowing a single [`Review`] per reviewer of
/// a [`Reservation`].
///
/// [`Reservation`]: crate::domain::Reservation
/// [`Review`]: crate::domain::Review
pub const UNIQUE_REVIEW: &str = "reviews_reservation_reviewer_key";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Lock on a value is held by another transaction.
    #[display("lock is held by another transaction")]
    #[from(ignore)]
    Contended,

    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    #[from(ignore)]
    Duplicate(#[error(not(source))] &'static str),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    #[display("`Postgres` error: {_0}")]
    Postgres(postgres::Error),
}

impl Error {
    /// Indicates whether this [`Error`] is caused by a concurrent transaction,
    /// so retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_contended(&self) -> bool {
        match self {
            Self::Contended => true,
            Self::Duplicate(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_contended(),
        }
    }

    /// Checks if this [`Error`] is a unique violation of the specified
    /// constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Contended => false,
            Self::Duplicate(c) => constraint.map_or(true, |name| name == *c),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }
}
