//! [`Reservation`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{
        reservation::{self, Period, Status},
        Reservation,
    },
    infra::{
        database::{
            self,
            postgres::{advisory_key, Connection},
            Postgres,
        },
        Database,
    },
    read::reservation::{Occupying, OfHost, OfTutor},
};

/// Columns of a [`Reservation`] row.
const COLUMNS: &str = "\
    id, tutor_id, host_id, start_date, end_date, pet_ids, \
    daily_rate, total, currency, status, created_at";

/// Restores a [`Reservation`] from the provided row of [`COLUMNS`].
fn from_row(row: &Row) -> Reservation {
    let currency = row.get("currency");
    Reservation::restore(
        row.get("id"),
        row.get("tutor_id"),
        row.get("host_id"),
        Period::new(row.get("start_date"), row.get("end_date"))
            .expect("`reservations_period_check` violated"),
        row.get("pet_ids"),
        Money {
            amount: row.get("daily_rate"),
            currency,
        },
        Money {
            amount: row.get("total"),
            currency,
        },
        row.get("status"),
        row.get("created_at"),
    )
}

/// Selects [`Reservation`]s matching the provided SQL `condition`, the most
/// recently created first.
async fn select<C: Connection>(
    db: &Postgres<C>,
    condition: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<Reservation>, Traced<database::Error>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM reservations \
         WHERE {condition} \
         ORDER BY created_at DESC, id",
    );
    Ok(db
        .query(&sql, params)
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(from_row)
        .collect())
}

/// [`Status`]es to bind as an `INT2[]` parameter.
fn occupying() -> &'static [Status] {
    &Status::OCCUPYING
}

impl<C> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        Ok(select(self, "id = $1::UUID", &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, OfTutor>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfTutor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfTutor(tutor_id) = by.into_inner();

        select(self, "tutor_id = $1::UUID", &[&tutor_id])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, OfHost>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();

        select(self, "host_id = $1::UUID", &[&host_id])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Occupying<Vec<Reservation>>, OfTutor>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Occupying<Vec<Reservation>>, OfTutor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfTutor(tutor_id) = by.into_inner();

        select(
            self,
            "tutor_id = $1::UUID AND status = ANY($2::INT2[])",
            &[&tutor_id, &occupying()],
        )
        .await
        .map(Occupying)
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Occupying<Vec<Reservation>>, OfHost>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Occupying<Vec<Reservation>>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();

        select(
            self,
            "host_id = $1::UUID AND status = ANY($2::INT2[])",
            &[&host_id, &occupying()],
        )
        .await
        .map(Occupying)
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Occupying<Vec<Reservation>>, Period>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Occupying<Vec<Reservation>>, Period>>,
    ) -> Result<Self::Ok, Self::Err> {
        let period = by.into_inner();
        let (start, end) = (period.start(), period.end());

        // Half-open ranges overlap iff each starts before the other ends.
        select(
            self,
            "start_date < $2::DATE AND $1::DATE < end_date \
             AND status = ANY($3::INT2[])",
            &[&start, &end, &occupying()],
        )
        .await
        .map(Occupying)
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Reservation, reservation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: Uuid = by.into_inner().into();

        self.try_advisory_lock(advisory_key("reservation", id))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = reservation.id();
        let tutor_id = reservation.tutor_id();
        let host_id = reservation.host_id();
        let period = reservation.period();
        let (start, end) = (period.start(), period.end());
        let pet_ids = reservation.pet_ids();
        let daily_rate: Decimal = reservation.daily_rate().amount;
        let total: Decimal = reservation.total().amount;
        let currency = reservation.daily_rate().currency;
        let status = reservation.status();
        let created_at = reservation.created_at();

        const SQL: &str = "\
            INSERT INTO reservations (\
                id, tutor_id, host_id, start_date, end_date, pet_ids, \
                daily_rate, total, currency, status, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::DATE, $5::DATE, \
                $6::UUID[], $7::NUMERIC, $8::NUMERIC, $9::INT2, $10::INT2, \
                $11::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &tutor_id,
                &host_id,
                &start,
                &end,
                &pet_ids,
                &daily_rate,
                &total,
                &currency,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = reservation.id();
        let status = reservation.status();

        // Only the status of a `Reservation` ever changes.
        const SQL: &str = "\
            UPDATE reservations \
            SET status = $2::INT2 \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &status])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Reservation, reservation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM reservations \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
