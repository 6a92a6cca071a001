//! [`Query`] collection related to a single [`Reservation`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{reservation, user, Reservation},
    infra::{database, Database},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Reservation`] by its [`reservation::Id`].
pub type ById = DatabaseQuery<By<Option<Reservation>, reservation::Id>>;

/// [`Query`] of a [`Reservation`] on behalf of one of its parties.
#[derive(Clone, Copy, Debug)]
pub struct ForParty {
    /// ID of the [`Reservation`] to query.
    pub reservation_id: reservation::Id,

    /// ID of the querying user.
    pub user_id: user::Id,
}

impl<Db, Clk> Query<ForParty> for Service<Db, Clk>
where
    Db: Database<
        Select<By<Option<Reservation>, reservation::Id>>,
        Ok = Option<Reservation>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Reservation>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: ForParty) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ForParty {
            reservation_id,
            user_id,
        } = query;

        let Some(reservation) = self
            .database()
            .execute(Select(By::<Option<Reservation>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            return Ok(None);
        };
        if !reservation.is_party(user_id) {
            return Err(tracerr::new!(E::NotParticipant(user_id)));
        }
        Ok(Some(reservation))
    }
}

/// Error of [`ForParty`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// User is not a party of the [`Reservation`].
    #[display("`User(id: {_0})` is not a party of the `Reservation`")]
    NotParticipant(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::user,
        fixture,
        query::{reservations, Query as _},
    };

    use super::{ExecutionError as E, ForParty};

    #[tokio::test]
    async fn shows_reservation_to_its_parties_only() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let reservation =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;

        for user_id in [host.id, reservation.tutor_id()] {
            let found = svc
                .execute(ForParty {
                    reservation_id: reservation.id(),
                    user_id,
                })
                .await
                .unwrap();
            assert_eq!(found.as_ref(), Some(&reservation));
        }

        let err = svc
            .execute(ForParty {
                reservation_id: reservation.id(),
                user_id: user::Id::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::NotParticipant(_)));
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let older =
            fixture::reservation(&svc, &host, "2025-02-01", "2025-02-04").await;
        let newer =
            fixture::reservation(&svc, &host, "2025-03-01", "2025-03-04").await;

        let listed = svc
            .execute(reservations::OfHost::by(
                crate::read::reservation::OfHost(host.id),
            ))
            .await
            .unwrap();
        let ids = listed.iter().map(|r| r.id()).collect::<Vec<_>>();
        assert_eq!(ids.len(), 2);
        if older.created_at() != newer.created_at() {
            assert_eq!(ids, vec![newer.id(), older.id()]);
        }

        let own = svc
            .execute(reservations::OfTutor::by(
                crate::read::reservation::OfTutor(older.tutor_id()),
            ))
            .await
            .unwrap();
        assert_eq!(own, vec![older]);
    }
}
