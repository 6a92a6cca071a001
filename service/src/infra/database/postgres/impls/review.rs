//! [`Review`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{reservation, Review},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::review::About,
};

/// Restores a [`Review`] from the provided row.
fn from_row(row: &Row) -> Review {
    Review {
        id: row.get("id"),
        reservation_id: row.get("reservation_id"),
        reviewer_id: row.get("reviewer_id"),
        reviewed_id: row.get("reviewed_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Vec<Review>, reservation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, reservation_id, reviewer_id, reviewed_id, \
                   rating, comment, created_at \
            FROM reviews \
            WHERE reservation_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Review>, About>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, About>>,
    ) -> Result<Self::Ok, Self::Err> {
        let About(user_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, reservation_id, reviewer_id, reviewed_id, \
                   rating, comment, created_at \
            FROM reviews \
            WHERE reviewed_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Review>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        let Review {
            id,
            reservation_id,
            reviewer_id,
            reviewed_id,
            rating,
            comment,
            created_at,
        } = review;

        // Violates `reviews_reservation_reviewer_key` on a second review.
        const SQL: &str = "\
            INSERT INTO reviews (\
                id, reservation_id, reviewer_id, reviewed_id, \
                rating, comment, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::INT2, $6::TEXT, $7::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &reservation_id,
                &reviewer_id,
                &reviewed_id,
                &rating,
                &comment,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
