//! [`Review`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use rust_decimal::Decimal;
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    define_error, AsError, Context, Error,
};

/// A review left by one party of a completed `Reservation` about the other
/// one.
#[derive(Clone, Debug, From)]
pub struct Review(domain::Review);

/// A review left by one party of a completed `Reservation` about the other
/// one.
#[graphql_object(context = Context)]
impl Review {
    /// Unique identifier of this `Review`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the reviewed `Reservation`.
    #[must_use]
    pub fn reservation_id(&self) -> api::reservation::Id {
        self.0.reservation_id.into()
    }

    /// ID of the user who wrote this `Review`.
    #[must_use]
    pub fn reviewer_id(&self) -> api::user::Id {
        self.0.reviewer_id.into()
    }

    /// ID of the user this `Review` is about.
    #[must_use]
    pub fn reviewed_id(&self) -> api::user::Id {
        self.0.reviewed_id.into()
    }

    /// Number of stars given, from 1 to 5.
    #[must_use]
    pub fn rating(&self) -> i32 {
        u8::from(self.0.rating).into()
    }

    /// Optional free-form text.
    #[must_use]
    pub fn comment(&self) -> Option<Comment> {
        self.0.comment.clone().map(Into::into)
    }

    /// `DateTime` when this `Review` was written.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Review`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::review::Id)]
#[into(domain::review::Id)]
#[graphql(name = "ReviewId", transparent)]
pub struct Id(Uuid);

/// Free-form text of a `Review`, at most 1024 characters long.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ReviewComment",
    with = scalar::Via::<domain::review::Comment>,
)]
pub struct Comment(domain::review::Comment);

/// Aggregated ratings of a user.
#[derive(Clone, Copy, Debug, From)]
pub struct Summary(domain::review::Summary);

/// Aggregated ratings of a user.
#[graphql_object(name = "RatingSummary", context = Context)]
impl Summary {
    /// Average number of stars, rounded to 2 decimal places.
    ///
    /// Zero when there are no `Review`s.
    #[must_use]
    pub fn average(&self) -> Average {
        self.0.average.into()
    }

    /// Number of `Review`s.
    #[must_use]
    pub fn count(&self) -> i32 {
        i32::try_from(self.0.count).unwrap_or(i32::MAX)
    }
}

/// Decimal average of ratings, like `4.33`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "RatingAverage", with = scalar::Via::<Decimal>)]
pub struct Average(Decimal);

impl AsError for domain::review::gate::Ineligibility {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_REVIEWED"]
                #[status = CONFLICT]
                #[message = "Authenticated user has already reviewed the \
                             `Reservation`"]
                AlreadyReviewed,

                #[code = "NOT_ELIGIBLE"]
                #[status = FORBIDDEN]
                #[message = "Only the other party of a completed \
                             `Reservation` may be reviewed"]
                NotEligible,
            }
        }

        Some(match self {
            Self::AlreadyReviewed(_) => Error::AlreadyReviewed.into(),
            Self::NotCompleted(_) | Self::NotCounterpart(_) => crate::Error {
                message: self.to_string(),
                ..Error::NotEligible.into()
            },
            Self::NotParticipant(_) => api::PrivilegeError::NotParty.into(),
        })
    }
}
