//! [`Reservation`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, define_error, AsError, Context, Error};

/// A stay of some pets of a tutor at a host.
#[derive(Clone, Debug, From)]
pub struct Reservation(domain::Reservation);

/// A stay of some pets of a tutor at a host.
#[graphql_object(context = Context)]
impl Reservation {
    /// Unique identifier of this `Reservation`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id().into()
    }

    /// ID of the tutor who requested this `Reservation`.
    #[must_use]
    pub fn tutor_id(&self) -> api::user::Id {
        self.0.tutor_id().into()
    }

    /// ID of the booked `Host`.
    #[must_use]
    pub fn host_id(&self) -> api::user::Id {
        self.0.host_id().into()
    }

    /// First day of the stay.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.0.period().start()
    }

    /// Day the stay ends, exclusive.
    #[must_use]
    pub fn end_date(&self) -> Date {
        self.0.period().end()
    }

    /// Number of days of the stay.
    #[must_use]
    pub fn days(&self) -> i32 {
        i32::try_from(self.0.period().days()).unwrap_or(i32::MAX)
    }

    /// IDs of the staying pets.
    #[must_use]
    pub fn pet_ids(&self) -> Vec<api::pet::Id> {
        self.0.pet_ids().iter().copied().map(Into::into).collect()
    }

    /// Daily rate of the `Host` at the moment of booking.
    #[must_use]
    pub fn daily_rate(&self) -> Money {
        self.0.daily_rate()
    }

    /// Total price of the stay.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0.total()
    }

    /// Current status of this `Reservation`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// `DateTime` when this `Reservation` was requested.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at().coerce()
    }

    /// `Review`s written about each other by the parties of this
    /// `Reservation`, the most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.reviews",
            id = %self.0.id(),
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviews(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::reviews::ForReservation::by(self.0.id()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|reviews| reviews.into_iter().map(Into::into).collect())
    }
}

/// Unique identifier of a `Reservation`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::reservation::Id)]
#[into(domain::reservation::Id)]
#[graphql(name = "ReservationId", transparent)]
pub struct Id(Uuid);

/// Lifecycle status of a `Reservation`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ReservationStatus")]
pub enum Status {
    /// Requested by the tutor, awaiting the host's decision.
    #[graphql(name = "Pendente")]
    Pendente,

    /// Accepted by the host.
    #[graphql(name = "Confirmada")]
    Confirmada,

    /// Refused by the host.
    #[graphql(name = "Negada")]
    Negada,

    /// Stay is in progress.
    #[graphql(name = "EmAndamento")]
    EmAndamento,

    /// Stay is over.
    #[graphql(name = "Concluida")]
    Concluida,
}

impl From<domain::reservation::Status> for Status {
    fn from(status: domain::reservation::Status) -> Self {
        use domain::reservation::Status as S;
        match status {
            S::Pendente => Self::Pendente,
            S::Confirmada => Self::Confirmada,
            S::Negada => Self::Negada,
            S::EmAndamento => Self::EmAndamento,
            S::Concluida => Self::Concluida,
        }
    }
}

impl AsError for domain::reservation::InvalidReservation {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_PETS"]
                #[status = BAD_REQUEST]
                #[message = "At least one pet must be selected"]
                NoPets,

                #[code = "DUPLICATE_PET"]
                #[status = BAD_REQUEST]
                #[message = "The same pet is selected more than once"]
                DuplicatePet,

                #[code = "CAPACITY_EXCEEDED"]
                #[status = BAD_REQUEST]
                #[message = "More pets are selected than the `Host` accepts"]
                CapacityExceeded,

                #[code = "PRICE_OVERFLOW"]
                #[status = BAD_REQUEST]
                #[message = "Total price of the stay is too large"]
                PriceOverflow,
            }
        }

        Some(match self {
            Self::NoPets => Error::NoPets.into(),
            Self::DuplicatePet(_) => Error::DuplicatePet.into(),
            Self::CapacityExceeded { .. } => crate::Error {
                message: self.to_string(),
                ..Error::CapacityExceeded.into()
            },
            Self::PriceOverflow => Error::PriceOverflow.into(),
        })
    }
}

impl AsError for domain::reservation::InvalidTransition {
    fn try_as_error(&self) -> Option<Error> {
        use domain::reservation::Reason;

        Some(match self.reason {
            Reason::Unauthorized => api::PrivilegeError::NotParty.into(),
            Reason::WrongState | Reason::Premature => Error {
                message: self.to_string(),
                ..api::ReservationStateError::InvalidTransition.into()
            },
        })
    }
}
