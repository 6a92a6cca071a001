//! Shared setup of [`Service`] tests.

use std::time::Duration;

use common::{money::Currency, Date, Money};
use rust_decimal::Decimal;

use crate::{
    command::{retry, Command as _, CreateReservation},
    domain::{
        host::{self, Capacity},
        pet::{self, Size, Species},
        user, Host, Pet, Reservation,
    },
    infra::{clock::Fixed, Memory},
    Config, Service,
};

/// Secret the test sessions are signed with.
pub(crate) const JWT_SECRET: &[u8] = b"pet-sitting-test-secret";

/// [`Service`] running on top of a [`Memory`] database and a [`Fixed`]
/// clock.
pub(crate) type TestService = Service<Memory, Fixed>;

/// Parses the provided `YYYY-MM-DD` string into a [`Date`].
pub(crate) fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// Creates a new [`TestService`] with an empty [`Memory`] database and the
/// clock standing at `2025-01-01`.
pub(crate) async fn service() -> (TestService, Fixed) {
    let clock = Fixed::new(date("2025-01-01"));
    let config = Config {
        jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(JWT_SECRET),
        lock: retry::Config {
            attempts: 5,
            backoff: Duration::from_millis(10),
        },
    };
    (
        Service::with_clock(config, Memory::new(), clock.clone()),
        clock,
    )
}

/// Stores a new active [`Host`] charging `50BRL` a day, accepting up to two
/// dogs or cats.
pub(crate) async fn host(svc: &TestService) -> Host {
    let host = Host {
        id: user::Id::new(),
        daily_rate: Money {
            amount: Decimal::from(50),
            currency: Currency::Brl,
        },
        capacity: Capacity::new(2).unwrap(),
        species: vec![species("cachorro"), species("gato")],
        size: Size::Medium,
        status: host::Status::Active,
    };
    svc.database().put_host(host.clone()).await;
    host
}

/// Stores a new [`Pet`] of the provided `species` owned by the `tutor_id`.
pub(crate) async fn pet(
    svc: &TestService,
    tutor_id: user::Id,
    species_name: &str,
) -> pet::Id {
    let pet = Pet {
        id: pet::Id::new(),
        tutor_id,
        species: species(species_name),
    };
    svc.database().put_pet(pet.clone()).await;
    pet.id
}

/// Requests a stay of a single new cat of a new tutor at the provided
/// [`Host`].
pub(crate) async fn reservation(
    svc: &TestService,
    host: &Host,
    start: &str,
    end: &str,
) -> Reservation {
    let tutor_id = user::Id::new();
    let pet_id = pet(svc, tutor_id, "gato").await;
    svc.execute(CreateReservation {
        tutor_id,
        host_id: host.id,
        pet_ids: vec![pet_id],
        start: date(start),
        end: date(end),
    })
    .await
    .unwrap()
}

fn species(name: &str) -> Species {
    Species::new(name).unwrap()
}
