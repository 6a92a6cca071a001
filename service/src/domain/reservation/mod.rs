//! [`Reservation`] definitions.

pub mod period;
pub mod pricing;
pub mod status;

use std::collections::HashSet;

use common::{unit, Date, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{pet, user, Host};

pub use self::{
    period::Period,
    pricing::quote,
    status::{Actor, InvalidTransition, Reason, Status, Transition},
};

/// Booking of a [`Host`] by a tutor for some of their pets.
///
/// Once created, only the [`Status`] of a [`Reservation`] changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Reservation {
    /// ID of this [`Reservation`].
    id: Id,

    /// ID of the tutor who requested this [`Reservation`].
    tutor_id: user::Id,

    /// ID of the booked [`Host`].
    host_id: user::Id,

    /// [`Period`] of the stay.
    period: Period,

    /// IDs of the pets staying, never empty.
    pet_ids: Vec<pet::Id>,

    /// Daily rate of the [`Host`] at the moment of booking.
    daily_rate: Money,

    /// Total price of the stay.
    total: Money,

    /// Current [`Status`] of this [`Reservation`].
    status: Status,

    /// [`DateTime`] when this [`Reservation`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    created_at: CreationDateTime,
}

impl Reservation {
    /// Creates a new [`Status::Pendente`] [`Reservation`] of the provided
    /// [`Host`], snapshotting its current daily rate.
    ///
    /// # Errors
    ///
    /// If the provided pets are empty, contain duplicates, don't fit the
    /// [`Host`] capacity, or the total price overflows.
    pub fn new(
        id: Id,
        tutor_id: user::Id,
        host: &Host,
        pet_ids: Vec<pet::Id>,
        period: Period,
        created_at: CreationDateTime,
    ) -> Result<Self, InvalidReservation> {
        use InvalidReservation as E;

        if pet_ids.is_empty() {
            return Err(E::NoPets);
        }
        let mut seen = HashSet::with_capacity(pet_ids.len());
        if let Some(dup) = pet_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(E::DuplicatePet(*dup));
        }
        if !host.capacity.fits(pet_ids.len()) {
            return Err(E::CapacityExceeded {
                requested: pet_ids.len(),
                capacity: host.capacity.into(),
            });
        }
        let total = quote(host.daily_rate, period.days(), pet_ids.len())
            .ok_or(E::PriceOverflow)?;

        Ok(Self {
            id,
            tutor_id,
            host_id: host.id,
            period,
            pet_ids,
            daily_rate: host.daily_rate,
            total,
            status: Status::Pendente,
            created_at,
        })
    }

    /// Restores a [`Reservation`] from its stored parts.
    #[expect(clippy::too_many_arguments, reason = "stored representation")]
    #[must_use]
    pub(crate) fn restore(
        id: Id,
        tutor_id: user::Id,
        host_id: user::Id,
        period: Period,
        pet_ids: Vec<pet::Id>,
        daily_rate: Money,
        total: Money,
        status: Status,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id,
            tutor_id,
            host_id,
            period,
            pet_ids,
            daily_rate,
            total,
            status,
            created_at,
        }
    }

    /// Returns ID of this [`Reservation`].
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns ID of the tutor of this [`Reservation`].
    #[must_use]
    pub fn tutor_id(&self) -> user::Id {
        self.tutor_id
    }

    /// Returns ID of the [`Host`] of this [`Reservation`].
    #[must_use]
    pub fn host_id(&self) -> user::Id {
        self.host_id
    }

    /// Returns [`Period`] of this [`Reservation`].
    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }

    /// Returns IDs of the pets of this [`Reservation`].
    #[must_use]
    pub fn pet_ids(&self) -> &[pet::Id] {
        &self.pet_ids
    }

    /// Returns the daily rate this [`Reservation`] was booked with.
    #[must_use]
    pub fn daily_rate(&self) -> Money {
        self.daily_rate
    }

    /// Returns the total price of this [`Reservation`].
    #[must_use]
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the current [`Status`] of this [`Reservation`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Overwrites the [`Status`] of this [`Reservation`] with the stored one.
    #[cfg(any(test, feature = "memory"))]
    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Returns [`CreationDateTime`] of this [`Reservation`].
    #[must_use]
    pub fn created_at(&self) -> CreationDateTime {
        self.created_at
    }

    /// Indicates whether the provided user is the tutor or the host of this
    /// [`Reservation`].
    #[must_use]
    pub fn is_party(&self, user_id: user::Id) -> bool {
        self.tutor_id == user_id || self.host_id == user_id
    }

    /// Returns the other party of this [`Reservation`], if the provided user
    /// is one of its parties.
    #[must_use]
    pub fn counterpart(&self, user_id: user::Id) -> Option<user::Id> {
        if user_id == self.tutor_id {
            Some(self.host_id)
        } else if user_id == self.host_id {
            Some(self.tutor_id)
        } else {
            None
        }
    }

    /// Returns the [`Actor`] the provided user acts as in this
    /// [`Reservation`], if any.
    #[must_use]
    pub fn actor(&self, user_id: user::Id) -> Option<Actor> {
        if user_id == self.host_id {
            Some(Actor::Host)
        } else if user_id == self.tutor_id {
            Some(Actor::Tutor)
        } else {
            None
        }
    }

    /// Returns the date-driven [`Transition`] which is due at the provided
    /// `today`, if any.
    #[must_use]
    pub fn due_transition(&self, today: Date) -> Option<Transition> {
        match self.status {
            Status::Confirmada if today >= self.period.start() => {
                Some(Transition::Start)
            }
            Status::EmAndamento if today >= self.period.end() => {
                Some(Transition::Complete)
            }
            Status::Pendente
            | Status::Confirmada
            | Status::EmAndamento
            | Status::Negada
            | Status::Concluida => None,
        }
    }

    /// Applies the provided [`Transition`] on behalf of the [`Actor`] at the
    /// provided `today`, returning the new [`Status`].
    ///
    /// This [`Reservation`] is left untouched on failure.
    ///
    /// # Errors
    ///
    /// With an [`InvalidTransition`] if the [`Transition`] is not legal in the
    /// current [`Status`], for the [`Actor`], or at `today`.
    pub fn apply(
        &mut self,
        transition: Transition,
        actor: Actor,
        today: Date,
    ) -> Result<Status, InvalidTransition> {
        let next = self.status.next(transition, actor)?;

        let ready = match transition {
            Transition::Confirm | Transition::Deny => true,
            Transition::Start => today >= self.period.start(),
            Transition::Complete => today >= self.period.end(),
        };
        if !ready {
            return Err(InvalidTransition {
                from: self.status,
                transition,
                reason: Reason::Premature,
            });
        }

        self.status = next;
        Ok(next)
    }
}

/// ID of a [`Reservation`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// [`DateTime`] of a [`Reservation`] creation.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Reservation, unit::Creation)>;

/// Error of creating a [`Reservation`] with invalid parts.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum InvalidReservation {
    /// No pets are selected.
    #[display("at least one pet must be selected")]
    NoPets,

    /// The same pet is selected twice.
    #[display("`Pet(id: {_0})` is selected more than once")]
    DuplicatePet(#[error(not(source))] pet::Id),

    /// More pets are selected than the [`Host`] accepts at once.
    #[display("{requested} pets selected, but `Host` accepts {capacity}")]
    CapacityExceeded {
        /// Number of selected pets.
        requested: usize,

        /// [`Host`] capacity.
        capacity: u16,
    },

    /// Total price doesn't fit into a [`Money`] amount.
    #[display("total price overflows")]
    PriceOverflow,
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        host::{self, Capacity},
        pet::{self, Size, Species},
        user, Host,
    };

    use super::{
        Actor, Id, InvalidReservation, Period, Reason, Reservation, Status,
        Transition,
    };

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn host(capacity: u16, rate: u32) -> Host {
        Host {
            id: user::Id::new(),
            daily_rate: Money {
                amount: Decimal::from(rate),
                currency: Currency::Brl,
            },
            capacity: Capacity::new(capacity).unwrap(),
            species: vec![Species::new("cachorro").unwrap()],
            size: Size::Small,
            status: host::Status::Active,
        }
    }

    fn reserve(host: &Host, pets: usize) -> Result<Reservation, InvalidReservation> {
        Reservation::new(
            Id::new(),
            user::Id::new(),
            host,
            (0..pets).map(|_| pet::Id::new()).collect(),
            Period::new(date("2025-02-01"), date("2025-02-04")).unwrap(),
            DateTime::now().coerce(),
        )
    }

    #[test]
    fn creates_pending_with_quote() {
        let host = host(2, 50);
        let res = reserve(&host, 2).unwrap();

        assert_eq!(res.status(), Status::Pendente);
        assert_eq!(res.host_id(), host.id);
        assert_eq!(res.daily_rate(), host.daily_rate);
        assert_eq!(res.total().amount, Decimal::from(300));
        assert_eq!(res.total().currency, Currency::Brl);
    }

    #[test]
    fn rejects_invalid_pet_selection() {
        let host = host(2, 50);

        assert_eq!(reserve(&host, 0), Err(InvalidReservation::NoPets));
        assert_eq!(
            reserve(&host, 3),
            Err(InvalidReservation::CapacityExceeded {
                requested: 3,
                capacity: 2,
            }),
        );

        let pet = pet::Id::new();
        let dup = Reservation::new(
            Id::new(),
            user::Id::new(),
            &host,
            vec![pet, pet],
            Period::new(date("2025-02-01"), date("2025-02-02")).unwrap(),
            DateTime::now().coerce(),
        );
        assert_eq!(dup, Err(InvalidReservation::DuplicatePet(pet)));
    }

    #[test]
    fn identifies_parties() {
        let host = host(1, 10);
        let res = reserve(&host, 1).unwrap();
        let stranger = user::Id::new();

        assert_eq!(res.counterpart(res.tutor_id()), Some(host.id));
        assert_eq!(res.counterpart(host.id), Some(res.tutor_id()));
        assert_eq!(res.counterpart(stranger), None);
        assert_eq!(res.actor(host.id), Some(Actor::Host));
        assert_eq!(res.actor(res.tutor_id()), Some(Actor::Tutor));
        assert!(!res.is_party(stranger));
    }

    #[test]
    fn follows_dates_through_lifecycle() {
        let host = host(2, 50);
        let mut res = reserve(&host, 1).unwrap();
        let before = date("2025-01-20");

        assert_eq!(res.due_transition(before), None);
        assert_eq!(
            res.apply(Transition::Confirm, Actor::Host, before),
            Ok(Status::Confirmada),
        );

        assert_eq!(res.due_transition(date("2025-01-31")), None);
        let err = res
            .apply(Transition::Start, Actor::System, date("2025-01-31"))
            .unwrap_err();
        assert_eq!(err.reason, Reason::Premature);
        assert_eq!(res.status(), Status::Confirmada);

        assert_eq!(
            res.due_transition(date("2025-02-01")),
            Some(Transition::Start),
        );
        assert_eq!(
            res.apply(Transition::Start, Actor::Tutor, date("2025-02-01")),
            Ok(Status::EmAndamento),
        );

        assert_eq!(res.due_transition(date("2025-02-03")), None);
        assert_eq!(
            res.due_transition(date("2025-02-04")),
            Some(Transition::Complete),
        );
        assert_eq!(
            res.apply(Transition::Complete, Actor::System, date("2025-02-04")),
            Ok(Status::Concluida),
        );
        assert_eq!(res.due_transition(date("2030-01-01")), None);
    }

    #[test]
    fn failed_transition_leaves_state() {
        let host = host(2, 50);
        let mut res = reserve(&host, 1).unwrap();
        let today = date("2025-01-01");

        assert!(res.apply(Transition::Confirm, Actor::Tutor, today).is_err());
        assert_eq!(res.status(), Status::Pendente);

        assert_eq!(
            res.apply(Transition::Deny, Actor::Host, today),
            Ok(Status::Negada),
        );
        for transition in Transition::ALL {
            let err = res.apply(transition, Actor::Host, today).unwrap_err();
            assert_eq!(err.from, Status::Negada);
        }
        assert_eq!(res.status(), Status::Negada);
    }
}
