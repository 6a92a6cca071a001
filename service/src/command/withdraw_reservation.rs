//! [`Command`] for a tutor to withdraw a pending [`Reservation`].

use common::operations::{By, Commit, Delete, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation::{self, Status},
        user, Reservation,
    },
    infra::{database, Database},
    Service,
};

use super::{
    retry::{Attempts, Contended},
    Command,
};

/// [`Command`] for a tutor to withdraw their [`Reservation`] request before
/// the host decides upon it.
///
/// The [`Reservation`] is deleted.
#[derive(Clone, Copy, Debug)]
pub struct WithdrawReservation {
    /// ID of the [`Reservation`] to withdraw.
    pub reservation_id: reservation::Id,

    /// ID of the tutor withdrawing the [`Reservation`].
    pub tutor_id: user::Id,
}

impl<Db, Clk> Command<WithdrawReservation> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Reservation, reservation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: WithdrawReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let WithdrawReservation {
            reservation_id,
            tutor_id,
        } = cmd;

        let mut attempts =
            Attempts::new(self.config().lock, "WithdrawReservation");
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

                let reservation = tx
                    .execute(Select(By::<Option<Reservation>, _>::new(
                        reservation_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::ReservationNotExists(reservation_id))
                    .map_err(tracerr::wrap!())?;
                if reservation.tutor_id() != tutor_id {
                    return Err(tracerr::new!(E::NotTutor(tutor_id)));
                }
                if reservation.status() != Status::Pendente {
                    return Err(tracerr::new!(E::NotWithdrawable(
                        reservation.status()
                    )));
                }

                tx.execute(Delete(By::<Reservation, _>::new(reservation_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                Ok::<_, Traced<E>>(())
            }
            .await;

            if let Some(res) = attempts.settle(res).await {
                res?;
                log::info!("`Reservation(id: {reservation_id})` withdrawn");
                break Ok(());
            }
        }
    }
}

/// Error of [`WithdrawReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Locks kept being held by concurrent transactions.
    #[display("`Reservation` is busy with concurrent requests, try again later")]
    Conflict,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// User is not the tutor of the [`Reservation`].
    #[display("`User(id: {_0})` is not the tutor of the `Reservation`")]
    NotTutor(#[error(not(source))] user::Id),

    /// [`Reservation`] is already decided upon.
    #[display("`Reservation` is already `{_0}`")]
    NotWithdrawable(#[error(not(source))] Status),

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

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{Command as _, Decision, RespondToRequest},
        domain::{reservation::Status, Reservation},
        fixture,
        infra::Database as _,
    };

    use super::{ExecutionError as E, WithdrawReservation};

    #[tokio::test]
    async fn tutor_withdraws_pending_request() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let reservation =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;

        let err = svc
            .execute(WithdrawReservation {
                reservation_id: reservation.id(),
                tutor_id: host.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::NotTutor(_)), "{err}");

        svc.execute(WithdrawReservation {
            reservation_id: reservation.id(),
            tutor_id: reservation.tutor_id(),
        })
        .await
        .unwrap();
        assert!(svc
            .database()
            .execute(Select(By::<Option<Reservation>, _>::new(
                reservation.id()
            )))
            .await
            .unwrap()
            .is_none());

        // Dates are free again.
        _ = fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;
    }

    #[tokio::test]
    async fn decided_request_stays() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let reservation =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;
        _ = svc
            .execute(RespondToRequest {
                reservation_id: reservation.id(),
                host_id: host.id,
                decision: Decision::Confirm,
            })
            .await
            .unwrap();

        let err = svc
            .execute(WithdrawReservation {
                reservation_id: reservation.id(),
                tutor_id: reservation.tutor_id(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            E::NotWithdrawable(Status::Confirmada),
        ));
    }
}
