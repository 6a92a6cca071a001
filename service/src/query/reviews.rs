//! [`Query`] collection related to multiple [`Review`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        reservation,
        review::Summary,
        user, Review,
    },
    infra::{database, Database},
    read,
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries the [`Review`]s of a [`Reservation`], the most recent first.
///
/// [`Reservation`]: crate::domain::Reservation
pub type ForReservation = DatabaseQuery<By<Vec<Review>, reservation::Id>>;

/// Queries the [`Review`]s written about a user, the most recent first.
pub type About = DatabaseQuery<By<Vec<Review>, read::review::About>>;

/// [`Query`] summarizing the [`Review`]s written about a user.
#[derive(Clone, Copy, Debug)]
pub struct RatingOf(pub user::Id);

impl<Db, Clk> Query<RatingOf> for Service<Db, Clk>
where
    Db: Database<
        Select<By<Vec<Review>, read::review::About>>,
        Ok = Vec<Review>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Summary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        RatingOf(user_id): RatingOf,
    ) -> Result<Self::Ok, Self::Err> {
        let reviews = self
            .database()
            .execute(Select(By::<Vec<Review>, _>::new(read::review::About(
                user_id,
            ))))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Summary::of(&reviews))
    }
}
