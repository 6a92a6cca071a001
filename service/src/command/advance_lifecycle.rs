//! [`Command`] for advancing a [`Reservation`] through its stay.

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation::{self, Actor, InvalidTransition},
        user, Reservation,
    },
    infra::{database, Clock, Database},
    Service,
};

use super::{
    retry::{Attempts, Contended},
    Command,
};

/// [`Command`] for applying the date-driven transitions of a [`Reservation`]
/// which are due today.
///
/// Nothing being due is not an error.
#[derive(Clone, Copy, Debug)]
pub struct AdvanceLifecycle {
    /// ID of the [`Reservation`] to advance.
    pub reservation_id: reservation::Id,

    /// ID of the party requesting the advancement.
    ///
    /// [`None`] means housekeeping on behalf of nobody in particular.
    pub initiator_id: Option<user::Id>,
}

impl<Db, Clk> Command<AdvanceLifecycle> for Service<Db, Clk>
where
    Clk: Clock,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<Update<Reservation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AdvanceLifecycle,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdvanceLifecycle {
            reservation_id,
            initiator_id,
        } = cmd;

        let mut attempts =
            Attempts::new(self.config().lock, "AdvanceLifecycle");
        loop {
            let res = async {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                tx.execute(Lock(By::<Reservation, _>::new(reservation_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                let mut reservation = tx
                    .execute(Select(By::<Option<Reservation>, _>::new(
                        reservation_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::ReservationNotExists(reservation_id))
                    .map_err(tracerr::wrap!())?;

                let actor = match initiator_id {
                    Some(id) => reservation
                        .actor(id)
                        .ok_or(E::NotParticipant(id))
                        .map_err(tracerr::wrap!())?,
                    None => Actor::System,
                };

                let today = self.today();
                let initial = reservation.status();
                while let Some(transition) = reservation.due_transition(today)
                {
                    _ = reservation
                        .apply(transition, actor, today)
                        .map_err(tracerr::from_and_wrap!(=> E))?;
                }
                if reservation.status() == initial {
                    return Ok(reservation);
                }

                tx.execute(Update(reservation.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                log::info!(
                    "`Reservation(id: {reservation_id})` advanced from \
                     `{initial}` to `{}`",
                    reservation.status(),
                );
                Ok::<_, Traced<E>>(reservation)
            }
            .await;

            if let Some(res) = attempts.settle(res).await {
                break res;
            }
        }
    }
}

/// Error of [`AdvanceLifecycle`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Locks kept being held by concurrent transactions.
    #[display("`Reservation` is busy with concurrent requests, try again later")]
    Conflict,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Due transition turned out to be illegal.
    #[display("{_0}")]
    #[from]
    InvalidTransition(InvalidTransition),

    /// Initiator is not a party of the [`Reservation`].
    #[display("`User(id: {_0})` is not a party of the `Reservation`")]
    NotParticipant(#[error(not(source))] user::Id),

    /// [`Reservation`] with the provided ID does not exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    ReservationNotExists(#[error(not(source))] reservation::Id),
}

impl Contended for ExecutionError {
    fn is_contended(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_contended())
    }

    fn exhausted() -> Self {
        Self::Conflict
    }
}
