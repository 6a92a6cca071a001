//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;
use xxhash_rust::xxh3::xxh3_64;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),
}

impl Error {
    /// Indicates whether this [`Error`] is caused by a concurrent
    /// transaction, so the whole transaction may be retried.
    #[must_use]
    pub fn is_contended(&self) -> bool {
        match self {
            Self::Connection(e) => e.code().is_some_and(|c| {
                [
                    SqlState::T_R_SERIALIZATION_FAILURE,
                    SqlState::T_R_DEADLOCK_DETECTED,
                    SqlState::LOCK_NOT_AVAILABLE,
                ]
                .contains(c)
            }),
            Self::PoolError(..) | Self::PoolCreationError(..) => false,
        }
    }

    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(&SqlState::UNIQUE_VIOLATION)
                    && constraint.map_or(true, |c| {
                        e.as_db_error().and_then(|e| e.constraint()) == Some(c)
                    })
            }
            Self::PoolError(..) | Self::PoolCreationError(..) => false,
        }
    }
}

/// Derives the key of a transaction-scoped advisory lock on the value of the
/// provided `kind` identified by `id`.
fn advisory_key(kind: &str, id: impl AsRef<[u8]>) -> i64 {
    let mut buf = Vec::with_capacity(kind.len() + 17);
    buf.extend_from_slice(kind.as_bytes());
    buf.push(b':');
    buf.extend_from_slice(id.as_ref());
    i64::from_be_bytes(xxh3_64(&buf).to_be_bytes())
}

#[cfg(test)]
mod spec {
    use uuid::Uuid;

    use super::advisory_key;

    #[test]
    fn advisory_keys_differ_per_kind() {
        let id = Uuid::new_v4();

        assert_eq!(advisory_key("host", id), advisory_key("host", id));
        assert_ne!(advisory_key("host", id), advisory_key("pet", id));
        assert_ne!(
            advisory_key("host", id),
            advisory_key("host", Uuid::new_v4()),
        );
    }
}
