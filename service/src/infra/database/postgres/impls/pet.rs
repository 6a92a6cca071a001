//! [`Pet`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Lock, Select};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{pet, Pet},
    infra::{
        database::{
            self,
            postgres::{advisory_key, Connection},
            Postgres,
        },
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<pet::Id, Pet>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[pet::Id]>,
{
    type Ok = HashMap<pet::Id, Pet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<pet::Id, Pet>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[pet::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, tutor_id, species \
            FROM pets \
            WHERE id = ANY($1::UUID[])";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Pet {
                        id,
                        tutor_id: row.get("tutor_id"),
                        species: row.get("species"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Lock<By<Pet, pet::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Pet, pet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: Uuid = by.into_inner().into();

        self.try_advisory_lock(advisory_key("pet", id))
            .await
            .map_err(tracerr::wrap!())
    }
}
