//! [`Command`] for creating a new [`Reservation`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        availability,
        pet::{self, Species},
        reservation::{self, InvalidReservation, Period},
        user, Host, Pet, Reservation,
    },
    infra::{database, Clock, Database},
    read::reservation::{Occupying, OfHost, OfTutor},
    Service,
};

use super::{
    retry::{Attempts, Contended},
    Command,
};

/// [`Command`] for requesting a stay at a [`Host`].
#[derive(Clone, Debug)]
pub struct CreateReservation {
    /// ID of the tutor requesting the stay.
    pub tutor_id: user::Id,

    /// ID of the [`Host`] to stay at.
    pub host_id: user::Id,

    /// IDs of the staying [`Pet`]s.
    pub pet_ids: Vec<pet::Id>,

    /// First day of the stay.
    pub start: Date,

    /// Day the stay ends, exclusive.
    pub end: Date,
}

impl<Db, Clk> Command<CreateReservation> for Service<Db, Clk>
where
    Clk: Clock,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Host, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Pet, pet::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Host>, user::Id>>,
            Ok = Option<Host>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<pet::Id, Pet>, Vec<pet::Id>>>,
            Ok = HashMap<pet::Id, Pet>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Occupying<Vec<Reservation>>, OfHost>>,
            Ok = Occupying<Vec<Reservation>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Occupying<Vec<Reservation>>, OfTutor>>,
            Ok = Occupying<Vec<Reservation>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Reservation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReservation {
            tutor_id,
            host_id,
            pet_ids,
            start,
            end,
        } = cmd;

        let period = Period::new(start, end)
            .ok_or(E::InvalidPeriod { start, end })
            .map_err(tracerr::wrap!())?;
        if start < self.today() {
            return Err(tracerr::new!(E::StartInPast(start)));
        }
        if tutor_id == host_id {
            return Err(tracerr::new!(E::SelfBooking(tutor_id)));
        }

        let mut attempts =
            Attempts::new(self.config().lock, "CreateReservation");
        loop {
            let res = async {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Serialize bookings of the same `Host`.
                tx.execute(Lock(By::<Host, _>::new(host_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                let host = tx
                    .execute(Select(By::<Option<Host>, _>::new(host_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::HostNotExists(host_id))
                    .map_err(tracerr::wrap!())?;
                if !host.is_bookable() {
                    return Err(tracerr::new!(E::HostNotBookable(host_id)));
                }

                let reservation = Reservation::new(
                    reservation::Id::new(),
                    tutor_id,
                    &host,
                    pet_ids.clone(),
                    period,
                    DateTime::now().coerce(),
                )
                .map_err(tracerr::from_and_wrap!(=> E))?;

                // Serialize bookings of the same pets.
                for id in reservation.pet_ids() {
                    tx.execute(Lock(By::<Pet, _>::new(*id)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
                let pets = tx
                    .execute(Select(By::<HashMap<pet::Id, Pet>, _>::new(
                        reservation.pet_ids().to_vec(),
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                for id in reservation.pet_ids() {
                    let pet = pets
                        .get(id)
                        .ok_or(E::PetNotExists(*id))
                        .map_err(tracerr::wrap!())?;
                    if pet.tutor_id != tutor_id {
                        return Err(tracerr::new!(E::PetNotOwned(*id)));
                    }
                    if !host.accepts(&pet.species) {
                        return Err(tracerr::new!(E::SpeciesNotAccepted(
                            pet.species.clone()
                        )));
                    }
                }

                let Occupying(booked) = tx
                    .execute(Select(
                        By::<Occupying<Vec<Reservation>>, _>::new(OfHost(
                            host_id,
                        )),
                    ))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if !availability::is_available(&booked, &period) {
                    return Err(tracerr::new!(E::HostUnavailable(host_id)));
                }

                let Occupying(own) = tx
                    .execute(Select(
                        By::<Occupying<Vec<Reservation>>, _>::new(OfTutor(
                            tutor_id,
                        )),
                    ))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if let Some(id) = own
                    .iter()
                    .filter(|r| r.period().overlaps(&period))
                    .flat_map(Reservation::pet_ids)
                    .find(|id| reservation.pet_ids().contains(id))
                {
                    return Err(tracerr::new!(E::PetAlreadyBooked(*id)));
                }

                tx.execute(Insert(reservation.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                Ok::<_, Traced<E>>(reservation)
            }
            .await;

            if let Some(res) = attempts.settle(res).await {
                let reservation = res?;
                log::info!(
                    "`Reservation(id: {})` of `Host(id: {host_id})` requested \
                     for {period}",
                    reservation.id(),
                );
                break Ok(reservation);
            }
        }
    }
}

/// Error of [`CreateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Locks kept being held by concurrent transactions.
    #[display("`Host` is busy with concurrent requests, try again later")]
    Conflict,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Host`] doesn't accept new [`Reservation`]s.
    #[display("`Host(id: {_0})` doesn't accept reservations")]
    HostNotBookable(#[error(not(source))] user::Id),

    /// [`Host`] with the provided ID does not exist.
    #[display("`Host(id: {_0})` does not exist")]
    HostNotExists(#[error(not(source))] user::Id),

    /// [`Host`] is already booked for an overlapping [`Period`].
    #[display("`Host(id: {_0})` is unavailable for the requested dates")]
    HostUnavailable(#[error(not(source))] user::Id),

    /// Requested [`Reservation`] is invalid.
    #[display("Invalid `Reservation`: {_0}")]
    #[from]
    Invalid(InvalidReservation),

    /// Requested dates don't form a [`Period`].
    #[display("`{start}` is not before `{end}`")]
    InvalidPeriod {
        /// Requested first day.
        start: Date,

        /// Requested last day, exclusive.
        end: Date,
    },

    /// [`Pet`] already stays somewhere else for an overlapping [`Period`].
    #[display("`Pet(id: {_0})` is already booked for the requested dates")]
    PetAlreadyBooked(#[error(not(source))] pet::Id),

    /// [`Pet`] with the provided ID does not exist.
    #[display("`Pet(id: {_0})` does not exist")]
    PetNotExists(#[error(not(source))] pet::Id),

    /// [`Pet`] doesn't belong to the requesting tutor.
    #[display("`Pet(id: {_0})` belongs to another tutor")]
    PetNotOwned(#[error(not(source))] pet::Id),

    /// Tutor tries to book themselves.
    #[display("`User(id: {_0})` cannot book themselves")]
    SelfBooking(#[error(not(source))] user::Id),

    /// [`Host`] doesn't accept pets of the [`Species`].
    #[display("`Host` doesn't accept `{_0}`")]
    SpeciesNotAccepted(#[error(not(source))] Species),

    /// Stay starts before today.
    #[display("stay cannot start in the past: `{_0}`")]
    StartInPast(#[error(not(source))] Date),
}

impl Contended for ExecutionError {
    fn is_contended(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_contended())
    }

    fn exhausted() -> Self {
        Self::Conflict
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Lock, Transact};
    use futures::future;

    use crate::{
        command::Command as _,
        domain::{reservation::Status, user, Host, Reservation},
        fixture::{self, date},
        infra::Database as _,
    };

    use super::{CreateReservation, ExecutionError as E};

    #[tokio::test]
    async fn creates_pending_reservation_with_quote() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let pets = vec![
            fixture::pet(&svc, tutor, "cachorro").await,
            fixture::pet(&svc, tutor, "gato").await,
        ];

        let reservation = svc
            .execute(CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: pets.clone(),
                start: date("2025-02-01"),
                end: date("2025-02-04"),
            })
            .await
            .unwrap();

        assert_eq!(reservation.status(), Status::Pendente);
        assert_eq!(reservation.total().to_string(), "300BRL");
        assert_eq!(reservation.pet_ids(), pets.as_slice());
    }

    #[tokio::test]
    async fn rejects_exceeded_capacity_before_availability() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let first = fixture::pet(&svc, tutor, "gato").await;
        _ = svc
            .execute(CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: vec![first],
                start: date("2025-02-01"),
                end: date("2025-02-04"),
            })
            .await
            .unwrap();

        let other = user::Id::new();
        let mut pets = Vec::new();
        for _ in 0..3 {
            pets.push(fixture::pet(&svc, other, "gato").await);
        }
        let err = svc
            .execute(CreateReservation {
                tutor_id: other,
                host_id: host.id,
                pet_ids: pets,
                start: date("2025-02-02"),
                end: date("2025-02-03"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::Invalid(_)), "{err}");
    }

    #[tokio::test]
    async fn allows_touching_but_not_overlapping_stays() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let request = |tutor: user::Id, pet, start: &str, end: &str| {
            CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: vec![pet],
                start: date(start),
                end: date(end),
            }
        };

        let tutor = user::Id::new();
        let pet = fixture::pet(&svc, tutor, "cachorro").await;
        _ = svc
            .execute(request(tutor, pet, "2025-01-01", "2025-01-05"))
            .await
            .unwrap();

        let other = user::Id::new();
        let other_pet = fixture::pet(&svc, other, "cachorro").await;
        _ = svc
            .execute(request(other, other_pet, "2025-01-05", "2025-01-08"))
            .await
            .unwrap();

        let third = user::Id::new();
        let third_pet = fixture::pet(&svc, third, "gato").await;
        let err = svc
            .execute(request(third, third_pet, "2025-01-03", "2025-01-06"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::HostUnavailable(_)), "{err}");
    }

    #[tokio::test]
    async fn validates_dates_and_pets() {
        let (svc, clock) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let pet = fixture::pet(&svc, tutor, "cachorro").await;
        let request = |pet_ids, start: &str, end: &str| CreateReservation {
            tutor_id: tutor,
            host_id: host.id,
            pet_ids,
            start: date(start),
            end: date(end),
        };

        let err = svc
            .execute(request(vec![pet], "2025-02-04", "2025-02-04"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::InvalidPeriod { .. }), "{err}");

        clock.set(date("2025-02-02"));
        let err = svc
            .execute(request(vec![pet], "2025-02-01", "2025-02-04"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::StartInPast(_)), "{err}");

        let err = svc
            .execute(request(vec![], "2025-03-01", "2025-03-02"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::Invalid(_)), "{err}");

        let stranger = fixture::pet(&svc, user::Id::new(), "gato").await;
        let err = svc
            .execute(request(vec![stranger], "2025-03-01", "2025-03-02"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::PetNotOwned(_)), "{err}");

        let fish = fixture::pet(&svc, tutor, "peixe").await;
        let err = svc
            .execute(request(vec![fish], "2025-03-01", "2025-03-02"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::SpeciesNotAccepted(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_pet_booked_elsewhere() {
        let (svc, _) = fixture::service().await;
        let first = fixture::host(&svc).await;
        let second = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let pet = fixture::pet(&svc, tutor, "gato").await;
        let request = |host: &Host| CreateReservation {
            tutor_id: tutor,
            host_id: host.id,
            pet_ids: vec![pet],
            start: date("2025-02-01"),
            end: date("2025-02-04"),
        };

        _ = svc.execute(request(&first)).await.unwrap();
        let err = svc.execute(request(&second)).await.unwrap_err();

        assert!(matches!(err.as_ref(), E::PetAlreadyBooked(id) if *id == pet));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_requests_book_host_once() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;

        let mut requests = Vec::new();
        for day in 1..=8 {
            let tutor = user::Id::new();
            let pet = fixture::pet(&svc, tutor, "gato").await;
            let svc = svc.clone();
            let request = CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: vec![pet],
                start: date(&format!("2025-02-{day:02}")),
                end: date("2025-02-10"),
            };
            requests.push(tokio::spawn(async move {
                svc.execute(request).await
            }));
        }

        let mut booked = 0;
        for res in future::join_all(requests).await {
            match res.unwrap() {
                Ok(_) => booked += 1,
                Err(e) => assert!(
                    matches!(e.as_ref(), E::HostUnavailable(_) | E::Conflict),
                    "{e}",
                ),
            }
        }
        assert_eq!(booked, 1);
    }

    #[tokio::test]
    async fn fails_with_conflict_while_host_is_locked() {
        let (svc, _) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let pet = fixture::pet(&svc, tutor, "gato").await;

        let tx = svc.database().execute(Transact).await.unwrap();
        tx.execute(Lock(By::<Host, _>::new(host.id))).await.unwrap();

        let err = svc
            .execute(CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: vec![pet],
                start: date("2025-02-01"),
                end: date("2025-02-04"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::Conflict), "{err}");

        drop(tx);
        let reservation: Reservation = svc
            .execute(CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: vec![pet],
                start: date("2025-02-01"),
                end: date("2025-02-04"),
            })
            .await
            .unwrap();
        assert_eq!(reservation.status(), Status::Pendente);
    }
}
