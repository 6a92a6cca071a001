//! [`Command`] for a host to respond to a pending [`Reservation`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation::{self, Actor, InvalidTransition, Transition},
        user, Host, Reservation,
    },
    infra::{database, Clock, Database},
    Service,
};

use super::{
    retry::{Attempts, Contended},
    Command,
};

/// Decision of a [`Host`] upon a pending [`Reservation`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Decision {
    /// Accept the [`Reservation`].
    Confirm,

    /// Refuse the [`Reservation`].
    Deny,
}

impl From<Decision> for Transition {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Confirm => Self::Confirm,
            Decision::Deny => Self::Deny,
        }
    }
}

/// [`Command`] for a [`Host`] to confirm or deny a pending [`Reservation`].
#[derive(Clone, Copy, Debug)]
pub struct RespondToRequest {
    /// ID of the [`Reservation`] to respond to.
    pub reservation_id: reservation::Id,

    /// ID of the responding [`Host`].
    pub host_id: user::Id,

    /// [`Decision`] of the [`Host`].
    pub decision: Decision,
}

impl<Db, Clk> Command<RespondToRequest> for Service<Db, Clk>
where
    Clk: Clock,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Host, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
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
        cmd: RespondToRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RespondToRequest {
            reservation_id,
            host_id,
            decision,
        } = cmd;

        let mut attempts =
            Attempts::new(self.config().lock, "RespondToRequest");
        loop {
            let res = async {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Serialize decisions of the same `Host`.
                tx.execute(Lock(By::<Host, _>::new(host_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
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
                if reservation.host_id() != host_id {
                    return Err(tracerr::new!(E::NotHost(host_id)));
                }

                _ = reservation
                    .apply(decision.into(), Actor::Host, self.today())
                    .map_err(tracerr::from_and_wrap!(=> E))?;

                tx.execute(Update(reservation.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                Ok::<_, Traced<E>>(reservation)
            }
            .await;

            if let Some(res) = attempts.settle(res).await {
                let reservation = res?;
                log::info!(
                    "`Reservation(id: {reservation_id})` is now `{}`",
                    reservation.status(),
                );
                break Ok(reservation);
            }
        }
    }
}

/// Error of [`RespondToRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Locks kept being held by concurrent transactions.
    #[display("`Reservation` is busy with concurrent requests, try again later")]
    Conflict,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Transition`] is not legal for the [`Reservation`].
    #[display("{_0}")]
    #[from]
    InvalidTransition(InvalidTransition),

    /// User is not the [`Host`] of the [`Reservation`].
    #[display("`User(id: {_0})` is not the host of the `Reservation`")]
    NotHost(#[error(not(source))] user::Id),

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
        command::Command as _,
        domain::{
            reservation::{Reason, Status},
            user, Reservation,
        },
        fixture,
        infra::Database as _,
    };

    use super::{Decision, ExecutionError as E, RespondToRequest};

    #[tokio::test]
    async fn host_confirms_or_denies_once() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let first =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;
        let second =
            fixture::reservation(&svc, &host, "2025-03-01", "2025-03-04").await;
        let respond = |r: &Reservation, decision| RespondToRequest {
            reservation_id: r.id(),
            host_id: host.id,
            decision,
        };

        let confirmed =
            svc.execute(respond(&first, Decision::Confirm)).await.unwrap();
        assert_eq!(confirmed.status(), Status::Confirmada);
        let denied =
            svc.execute(respond(&second, Decision::Deny)).await.unwrap();
        assert_eq!(denied.status(), Status::Negada);

        let err = svc
            .execute(respond(&first, Decision::Deny))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::InvalidTransition(e) if e.reason == Reason::WrongState,
        ));
    }

    #[tokio::test]
    async fn only_own_host_may_respond() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let reservation =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;

        let stranger = user::Id::new();
        let err = svc
            .execute(RespondToRequest {
                reservation_id: reservation.id(),
                host_id: stranger,
                decision: Decision::Confirm,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::NotHost(id) if *id == stranger));

        let err = svc
            .execute(RespondToRequest {
                reservation_id: reservation.id(),
                host_id: reservation.tutor_id(),
                decision: Decision::Confirm,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::NotHost(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_opposite_decisions_apply_once() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let reservation =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;
        let respond = |decision| RespondToRequest {
            reservation_id: reservation.id(),
            host_id: host.id,
            decision,
        };

        let (confirm, deny) = tokio::join!(
            svc.execute(respond(Decision::Confirm)),
            svc.execute(respond(Decision::Deny)),
        );

        let winner = match (confirm, deny) {
            (Ok(r), Err(e)) | (Err(e), Ok(r)) => {
                assert!(
                    matches!(e.as_ref(), E::InvalidTransition(_)),
                    "{e}",
                );
                r.status()
            }
            (Ok(_), Ok(_)) => panic!("both decisions applied"),
            (Err(a), Err(b)) => panic!("no decision applied: {a}, {b}"),
        };
        let stored = svc
            .database()
            .execute(Select(By::<Option<Reservation>, _>::new(
                reservation.id(),
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), winner);
    }
}
