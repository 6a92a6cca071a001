//! Bounded retrying of [`Command`]s contending for the same locks.

use std::time;

use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use super::Command;

/// Configuration of retrying contended transactions.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Maximum number of attempts to run a transaction.
    #[default(3)]
    pub attempts: u32,

    /// Pause between two consecutive attempts.
    #[default(time::Duration::from_millis(50))]
    pub backoff: time::Duration,
}

/// Error which may be caused by a concurrent transaction.
pub trait Contended {
    /// Indicates whether this error is caused by a concurrent transaction
    /// holding the required locks.
    fn is_contended(&self) -> bool;

    /// Creates the error reported once all the attempts are exhausted.
    fn exhausted() -> Self;
}

/// Attempts of running a single transaction.
#[derive(Debug)]
pub(crate) struct Attempts {
    /// [`Config`] of these [`Attempts`].
    config: Config,

    /// Number of attempts made so far.
    made: u32,

    /// Name of the retried operation.
    name: &'static str,
}

impl Attempts {
    /// Starts counting [`Attempts`] of the named operation.
    pub(crate) fn new(config: Config, name: &'static str) -> Self {
        Self {
            config,
            made: 0,
            name,
        }
    }

    /// Settles the result of the last attempt.
    ///
    /// [`None`] is returned if the attempt failed due to contention and one
    /// more should be made (after a pause).
    pub(crate) async fn settle<T, E>(
        &mut self,
        res: Result<T, Traced<E>>,
    ) -> Option<Result<T, Traced<E>>>
    where
        E: Contended,
    {
        let contended = match &res {
            Err(e) => e.as_ref().is_contended(),
            Ok(_) => false,
        };
        if !contended {
            return Some(res);
        }

        self.made += 1;
        if self.made >= self.config.attempts {
            log::warn!(
                "`{}` gave up after {} contended attempts",
                self.name,
                self.made,
            );
            return Some(Err(tracerr::new!(E::exhausted())));
        }

        log::warn!(
            "`{}` attempt {} is contended, retrying in {:?}",
            self.name,
            self.made,
            self.config.backoff,
        );
        tokio::time::sleep(self.config.backoff).await;
        None
    }
}
