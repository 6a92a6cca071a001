//! Infrastructure layer.

pub mod clock;
pub mod database;

pub use self::{clock::Clock, database::Database};
#[cfg(any(test, feature = "memory"))]
pub use self::database::{memory, Memory};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
