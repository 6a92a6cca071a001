//! [`Quote`] definition.

use common::{
    operations::{By, Select},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, InvalidReservation, Period},
        user, Host,
    },
    infra::{database, Database},
    Service,
};

use super::Query;

/// [`Query`] for the price of a stay at a [`Host`], without booking it.
#[derive(Clone, Copy, Debug)]
pub struct Quote {
    /// ID of the [`Host`] to stay at.
    pub host_id: user::Id,

    /// [`Period`] of the stay.
    pub period: Period,

    /// Number of staying pets.
    pub pets: usize,
}

impl<Db, Clk> Query<Quote> for Service<Db, Clk>
where
    Db: Database<
        Select<By<Option<Host>, user::Id>>,
        Ok = Option<Host>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Money;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Quote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Quote {
            host_id,
            period,
            pets,
        } = query;

        let host = self
            .database()
            .execute(Select(By::<Option<Host>, _>::new(host_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::HostNotExists(host_id))
            .map_err(tracerr::wrap!())?;

        if pets == 0 {
            return Err(tracerr::new!(E::Invalid(InvalidReservation::NoPets)));
        }
        if !host.capacity.fits(pets) {
            return Err(tracerr::new!(E::Invalid(
                InvalidReservation::CapacityExceeded {
                    requested: pets,
                    capacity: host.capacity.into(),
                }
            )));
        }

        reservation::quote(host.daily_rate, period.days(), pets)
            .ok_or(E::Invalid(InvalidReservation::PriceOverflow))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`Quote`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Host`] with the provided ID does not exist.
    #[display("`Host(id: {_0})` does not exist")]
    HostNotExists(#[error(not(source))] user::Id),

    /// Requested stay is invalid.
    #[display("Invalid stay: {_0}")]
    #[from]
    Invalid(InvalidReservation),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            reservation::{InvalidReservation, Period},
            user,
        },
        fixture::{self, date},
        query::Query as _,
    };

    use super::{ExecutionError as E, Quote};

    #[tokio::test]
    async fn prices_candidate_stay() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let quote = |pets| Quote {
            host_id: host.id,
            period: Period::new(date("2025-02-01"), date("2025-02-04"))
                .unwrap(),
            pets,
        };

        let price = svc.execute(quote(2)).await.unwrap();
        assert_eq!(price.to_string(), "300BRL");

        let err = svc.execute(quote(3)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::Invalid(InvalidReservation::CapacityExceeded {
                requested: 3,
                capacity: 2,
            }),
        ));

        let err = svc.execute(quote(0)).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::Invalid(InvalidReservation::NoPets)));

        let err = svc
            .execute(Quote {
                host_id: user::Id::new(),
                ..quote(1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::HostNotExists(_)));
    }
}
