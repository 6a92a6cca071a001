//! [`Query`] collection related to multiple [`Host`]s.

use common::operations::{By, Select};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    domain::{
        availability::{self, Filter},
        reservation::Period,
        Host, Reservation,
    },
    infra::{database, Database},
    read::{host::Bookable, reservation::Occupying},
    Service,
};

use super::Query;

/// [`Query`] of the bookable [`Host`]s satisfying the [`Filter`] and free
/// for the whole [`Period`].
#[derive(Clone, Debug)]
pub struct AvailableHosts {
    /// Requested [`Period`].
    pub period: Period,

    /// [`Filter`] of [`Host`]s.
    pub filter: Filter,
}

impl<Db, Clk> Query<AvailableHosts> for Service<Db, Clk>
where
    Db: Database<
            Select<By<Vec<Host>, Bookable>>,
            Ok = Vec<Host>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Occupying<Vec<Reservation>>, Period>>,
            Ok = Occupying<Vec<Reservation>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Host>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        query: AvailableHosts,
    ) -> Result<Self::Ok, Self::Err> {
        let AvailableHosts { period, filter } = query;

        let hosts = self
            .database()
            .execute(Select(By::<Vec<Host>, _>::new(Bookable)))
            .await
            .map_err(tracerr::wrap!())?;
        if hosts.is_empty() {
            return Ok(hosts);
        }

        let Occupying(booked) = self
            .database()
            .execute(Select(By::<Occupying<Vec<Reservation>>, _>::new(period)))
            .await
            .map_err(tracerr::wrap!())?;
        let booked = booked.into_iter().into_group_map_by(Reservation::host_id);

        Ok(availability::filter_hosts(hosts, &booked, &period, &filter))
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            availability::Filter,
            host,
            pet::{Size, Species},
            reservation::Period,
        },
        fixture::{self, date},
        query::Query as _,
    };

    use super::AvailableHosts;

    fn period(start: &str, end: &str) -> Period {
        Period::new(date(start), date(end)).unwrap()
    }

    #[tokio::test]
    async fn skips_booked_and_unbookable_hosts() {
        let (svc, _) = fixture::service().await;
        let free = fixture::host(&svc).await;
        let booked = fixture::host(&svc).await;
        let mut banned = fixture::host(&svc).await;
        banned.status = host::Status::Banned;
        svc.database().put_host(banned).await;
        _ = fixture::reservation(&svc, &booked, "2025-02-01", "2025-02-05")
            .await;

        let found = svc
            .execute(AvailableHosts {
                period: period("2025-02-03", "2025-02-06"),
                filter: Filter::default(),
            })
            .await
            .unwrap();
        assert_eq!(found, vec![free.clone()]);

        let mut found = svc
            .execute(AvailableHosts {
                period: period("2025-02-05", "2025-02-08"),
                filter: Filter::default(),
            })
            .await
            .unwrap();
        found.sort_by_key(|h| h.id);
        let mut expected = vec![free, booked];
        expected.sort_by_key(|h| h.id);
        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn applies_filter() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let search = |filter| AvailableHosts {
            period: period("2025-02-01", "2025-02-02"),
            filter,
        };

        let found = svc
            .execute(search(Filter {
                species: vec![Species::new("Gato").unwrap()],
                sizes: vec![Size::Medium, Size::Large],
            }))
            .await
            .unwrap();
        assert_eq!(found, vec![host]);

        let found = svc
            .execute(search(Filter {
                species: vec![],
                sizes: vec![Size::Small],
            }))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
