//! GraphQL [`Query`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{
    domain::{availability::Filter, reservation::Period},
    query, read, Query as _,
};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Reservation` with the specified ID.
    ///
    /// Only the tutor and the host of the `Reservation` may see it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not a party of the `Reservation`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "reservation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::ForParty {
                reservation_id: id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::ReservationError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns all the `Reservation`s requested by the current user as a
    /// tutor, the most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myReservationsAsTutor",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_reservations_as_tutor(
        ctx: &Context,
    ) -> Result<Vec<api::Reservation>, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::reservations::OfTutor::by(
                read::reservation::OfTutor(my_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns all the `Reservation`s of the current user as a host, the
    /// most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myReservationsAsHost",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_reservations_as_host(
        ctx: &Context,
    ) -> Result<Vec<api::Reservation>, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::reservations::OfHost::by(
                read::reservation::OfHost(my_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Host`s accepting new `Reservation`s which are free for
    /// the whole stay from `start` until `end` (exclusive).
    ///
    /// Empty or omitted `species` and `sizes` don't constrain the result.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PERIOD` - `end` is not after `start`.
    #[tracing::instrument(
        skip_all,
        fields(
            end = %end,
            gql.name = "availableHosts",
            otel.name = Self::SPAN_NAME,
            start = %start,
        ),
    )]
    pub async fn available_hosts(
        start: Date,
        end: Date,
        species: Option<Vec<api::pet::Species>>,
        sizes: Option<Vec<api::pet::Size>>,
        ctx: &Context,
    ) -> Result<Vec<api::Host>, Error> {
        let period = period(start, end).map_err(ctx.error())?;

        ctx.service()
            .execute(query::AvailableHosts {
                period,
                filter: Filter {
                    species: species
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                    sizes: sizes
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|hosts| hosts.into_iter().map(Into::into).collect())
    }

    /// Calculates the price of a stay of `petsCount` pets at the `Host`
    /// without booking it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `HOST_NOT_EXISTS` - the `Host` with the specified ID does not exist;
    /// - `INVALID_PERIOD` - `end` is not after `start`;
    /// - `INVALID_PETS_COUNT` - `petsCount` is negative;
    /// - `NO_PETS` - `petsCount` is zero;
    /// - `CAPACITY_EXCEEDED` - the `Host` doesn't accept that many pets.
    #[tracing::instrument(
        skip_all,
        fields(
            end = %end,
            gql.name = "quote",
            host_id = %host_id,
            otel.name = Self::SPAN_NAME,
            pets_count = pets_count,
            start = %start,
        ),
    )]
    pub async fn quote(
        host_id: api::user::Id,
        start: Date,
        end: Date,
        pets_count: i32,
        ctx: &Context,
    ) -> Result<Money, Error> {
        let period = period(start, end).map_err(ctx.error())?;
        let pets = usize::try_from(pets_count)
            .map_err(|_| api::InputError::PetsCount.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::Quote {
                host_id: host_id.into(),
                period,
                pets,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Indicates whether the current user may review the other party of the
    /// `Reservation`.
    ///
    /// If `reviewedId` is specified, it must be the other party.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "canReview",
            otel.name = Self::SPAN_NAME,
            reservation_id = %reservation_id,
            reviewed_id = ?reviewed_id,
        ),
    )]
    pub async fn can_review(
        reservation_id: api::reservation::Id,
        reviewed_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::CanReview {
                reservation_id: reservation_id.into(),
                reviewer_id: my_id.into(),
                reviewed_id: reviewed_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Returns the `Review`s of the `Reservation`, the most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reservationReviews",
            otel.name = Self::SPAN_NAME,
            reservation_id = %reservation_id,
        ),
    )]
    pub async fn reservation_reviews(
        reservation_id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::reviews::ForReservation::by(reservation_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Review`s written about the user, the most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "userReviews",
            otel.name = Self::SPAN_NAME,
            user_id = %user_id,
        ),
    )]
    pub async fn user_reviews(
        user_id: api::user::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::reviews::About::by(read::review::About(
                user_id.into(),
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the summary of the `Review`s written about the user.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "userRating",
            otel.name = Self::SPAN_NAME,
            user_id = %user_id,
        ),
    )]
    pub async fn user_rating(
        user_id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::review::Summary, Error> {
        ctx.service()
            .execute(query::RatingOf(user_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Builds the [`Period`] of a stay from `start` until `end`.
///
/// # Errors
///
/// If `end` is not after `start`.
pub(crate) fn period(start: Date, end: Date) -> Result<Period, Error> {
    Period::new(start, end).ok_or_else(|| api::InputError::Period.into())
}

impl AsError for query::reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotParticipant(_) => {
                Some(api::PrivilegeError::NotParty.into())
            }
        }
    }
}

impl AsError for query::quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::HostNotExists(_) => Some(api::HostError::NotExists.into()),
            Self::Invalid(e) => e.try_as_error(),
        }
    }
}

impl AsError for query::review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ReservationNotExists(_) => {
                Some(api::ReservationError::NotExists.into())
            }
        }
    }
}
