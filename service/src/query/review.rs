//! [`Query`] collection related to a single [`Review`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        reservation,
        review::gate,
        user, Reservation, Review,
    },
    infra::{database, Database},
    Service,
};

use super::Query;

/// [`Query`] checking whether a user may write a [`Review`] about a
/// [`Reservation`].
#[derive(Clone, Copy, Debug)]
pub struct CanReview {
    /// ID of the [`Reservation`] to review.
    pub reservation_id: reservation::Id,

    /// ID of the user to write the [`Review`].
    pub reviewer_id: user::Id,

    /// ID of the user the [`Review`] would be about.
    ///
    /// [`None`] means the other party of the [`Reservation`].
    pub reviewed_id: Option<user::Id>,
}

impl<Db, Clk> Query<CanReview> for Service<Db, Clk>
where
    Db: Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Review>, reservation::Id>>,
            Ok = Vec<Review>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = bool;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: CanReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CanReview {
            reservation_id,
            reviewer_id,
            reviewed_id,
        } = query;

        let reservation = self
            .database()
            .execute(Select(By::<Option<Reservation>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ReservationNotExists(reservation_id))
            .map_err(tracerr::wrap!())?;
        let Some(reviewed_id) =
            reviewed_id.or_else(|| reservation.counterpart(reviewer_id))
        else {
            return Ok(false);
        };

        let existing = self
            .database()
            .execute(Select(By::<Vec<Review>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(gate::can_review(
            &reservation,
            reviewer_id,
            reviewed_id,
            &existing,
        ))
    }
}

/// Error of [`CanReview`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Reservation`] with the provided ID does not exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    ReservationNotExists(#[error(not(source))] reservation::Id),
}
