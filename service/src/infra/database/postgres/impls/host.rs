//! [`Host`]-related [`Database`] implementations.

use common::{
    operations::{By, Lock, Select},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{host, user, Host},
    infra::{
        database::{
            self,
            postgres::{advisory_key, Connection},
            Postgres,
        },
        Database,
    },
    read::host::Bookable,
};

/// Columns of a [`Host`] row.
const COLUMNS: &str = "\
    id, daily_rate, currency, capacity, species, size, status";

/// Restores a [`Host`] from the provided row of [`COLUMNS`].
fn from_row(row: &Row) -> Host {
    Host {
        id: row.get("id"),
        daily_rate: Money {
            amount: row.get("daily_rate"),
            currency: row.get("currency"),
        },
        capacity: row.get("capacity"),
        species: row.get("species"),
        size: row.get("size"),
        status: row.get("status"),
    }
}

impl<C> Database<Select<By<Option<Host>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Host>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Host>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM hosts WHERE id = $1::UUID");
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Host>, Bookable>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Host>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Host>, Bookable>>,
    ) -> Result<Self::Ok, Self::Err> {
        let bookable = [host::Status::Active, host::Status::Available];
        let bookable: &[host::Status] = &bookable;

        let sql = format!(
            "SELECT {COLUMNS} FROM hosts \
             WHERE status = ANY($1::INT2[]) \
             ORDER BY id",
        );
        Ok(self
            .query(&sql, &[&bookable])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Lock<By<Host, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Host, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: Uuid = by.into_inner().into();

        self.try_advisory_lock(advisory_key("host", id))
            .await
            .map_err(tracerr::wrap!())
    }
}
