//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, domain::review::Rating, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";

    /// Lets the current user as a host decide upon the pending
    /// `Reservation`.
    async fn respond(
        id: api::reservation::Id,
        decision: command::Decision,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::RespondToRequest {
                reservation_id: id.into(),
                host_id: my_id.into(),
                decision,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Requests a stay of the current user's pets at the `Host` from `start`
    /// until `end` (exclusive).
    ///
    /// The created `Reservation` awaits the host's decision.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PERIOD` - `end` is not after `start`;
    /// - `START_IN_PAST` - the stay starts before today;
    /// - `NO_PETS` - no pets are selected;
    /// - `DUPLICATE_PET` - the same pet is selected more than once;
    /// - `CAPACITY_EXCEEDED` - the `Host` doesn't accept that many pets;
    /// - `SPECIES_NOT_ACCEPTED` - the `Host` doesn't accept some of the pets;
    /// - `SELF_BOOKING` - the current user is the `Host`;
    /// - `HOST_NOT_EXISTS` - the `Host` with the specified ID does not exist;
    /// - `HOST_UNAVAILABLE` - the `Host` doesn't accept reservations or is
    ///                        booked for overlapping dates;
    /// - `PET_NOT_EXISTS` - some of the pets do not exist;
    /// - `FORBIDDEN` - some of the pets belong to another tutor;
    /// - `PET_ALREADY_BOOKED` - some of the pets stay elsewhere at that time;
    /// - `CONFLICT` - the `Host` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            end = %end,
            gql.name = "createReservation",
            host_id = %host_id,
            otel.name = Self::SPAN_NAME,
            pets = pet_ids.len(),
            start = %start,
        ),
    )]
    pub async fn create_reservation(
        host_id: api::user::Id,
        pet_ids: Vec<api::pet::Id>,
        start: Date,
        end: Date,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CreateReservation {
                tutor_id: my_id.into(),
                host_id: host_id.into(),
                pet_ids: pet_ids.into_iter().map(Into::into).collect(),
                start,
                end,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Accepts the pending `Reservation` of the current user as a host.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not the host of the `Reservation`;
    /// - `INVALID_TRANSITION` - the `Reservation` is not pending anymore;
    /// - `CONFLICT` - the `Reservation` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "confirmReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        Self::respond(id, command::Decision::Confirm, ctx).await
    }

    /// Refuses the pending `Reservation` of the current user as a host.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not the host of the `Reservation`;
    /// - `INVALID_TRANSITION` - the `Reservation` is not pending anymore;
    /// - `CONFLICT` - the `Reservation` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "denyReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn deny_reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        Self::respond(id, command::Decision::Deny, ctx).await
    }

    /// Moves the `Reservation` through the stay according to today's date:
    /// a confirmed stay starts on its first day and completes on its end
    /// day.
    ///
    /// Returns the `Reservation` unchanged if nothing is due yet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not a party of the `Reservation`;
    /// - `CONFLICT` - the `Reservation` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "advanceReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn advance_reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::AdvanceLifecycle {
                reservation_id: id.into(),
                initiator_id: Some(my_id.into()),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Withdraws the pending `Reservation` requested by the current user,
    /// freeing its dates.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not the tutor of the
    ///                 `Reservation`;
    /// - `INVALID_TRANSITION` - the host has already decided upon the
    ///                          `Reservation`;
    /// - `CONFLICT` - the `Reservation` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "withdrawReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn withdraw_reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::WithdrawReservation {
                reservation_id: id.into(),
                tutor_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }

    /// Reviews the other party of the completed `Reservation` on behalf of
    /// the current user.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RATING` - `rating` is not within 1..=5;
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `FORBIDDEN` - the current user is not a party of the `Reservation`;
    /// - `NOT_ELIGIBLE` - the `Reservation` is not completed, or `reviewedId`
    ///                    is not the other party;
    /// - `ALREADY_REVIEWED` - the current user has already reviewed the
    ///                        `Reservation`;
    /// - `CONFLICT` - the `Reservation` is busy with concurrent requests.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "submitReview",
            otel.name = Self::SPAN_NAME,
            rating = rating,
            reservation_id = %reservation_id,
            reviewed_id = %reviewed_id,
        ),
    )]
    pub async fn submit_review(
        reservation_id: api::reservation::Id,
        reviewed_id: api::user::Id,
        rating: i32,
        comment: Option<api::review::Comment>,
        ctx: &Context,
    ) -> Result<api::Review, Error> {
        let rating = Rating::try_from(rating)
            .map_err(|_| api::InputError::Rating.into())
            .map_err(ctx.error())?;

        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::SubmitReview {
                reservation_id: reservation_id.into(),
                reviewer_id: my_id.into(),
                reviewed_id: reviewed_id.into(),
                rating,
                comment: comment.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::create_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "HOST_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "`Host` is already booked for the requested dates"]
                HostUnavailable,

                #[code = "PET_ALREADY_BOOKED"]
                #[status = BAD_REQUEST]
                #[message = "Pet is already booked for the requested dates"]
                PetAlreadyBooked,

                #[code = "PET_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "Pet with the provided ID does not exist"]
                PetNotExists,

                #[code = "FORBIDDEN"]
                #[status = FORBIDDEN]
                #[message = "Pet belongs to another tutor"]
                PetNotOwned,

                #[code = "SELF_BOOKING"]
                #[status = BAD_REQUEST]
                #[message = "`Host` cannot book themselves"]
                SelfBooking,

                #[code = "SPECIES_NOT_ACCEPTED"]
                #[status = BAD_REQUEST]
                #[message = "`Host` doesn't accept the pet species"]
                SpeciesNotAccepted,

                #[code = "START_IN_PAST"]
                #[status = BAD_REQUEST]
                #[message = "Stay cannot start in the past"]
                StartInPast,
            }
        }

        Some(match self {
            Self::Conflict => api::ReservationStateError::Contended.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::HostNotBookable(_) => crate::Error {
                message: self.to_string(),
                ..Error::HostUnavailable.into()
            },
            Self::HostNotExists(_) => api::HostError::NotExists.into(),
            Self::HostUnavailable(_) => Error::HostUnavailable.into(),
            Self::Invalid(e) => return e.try_as_error(),
            Self::InvalidPeriod { .. } => api::InputError::Period.into(),
            Self::PetAlreadyBooked(_) => Error::PetAlreadyBooked.into(),
            Self::PetNotExists(_) => Error::PetNotExists.into(),
            Self::PetNotOwned(_) => Error::PetNotOwned.into(),
            Self::SelfBooking(_) => Error::SelfBooking.into(),
            Self::SpeciesNotAccepted(_) => crate::Error {
                message: self.to_string(),
                ..Error::SpeciesNotAccepted.into()
            },
            Self::StartInPast(_) => Error::StartInPast.into(),
        })
    }
}

impl AsError for command::respond_to_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict => api::ReservationStateError::Contended.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(e) => return e.try_as_error(),
            Self::NotHost(_) => api::PrivilegeError::NotHost.into(),
            Self::ReservationNotExists(_) => {
                api::ReservationError::NotExists.into()
            }
        })
    }
}

impl AsError for command::advance_lifecycle::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict => api::ReservationStateError::Contended.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(e) => return e.try_as_error(),
            Self::NotParticipant(_) => api::PrivilegeError::NotParty.into(),
            Self::ReservationNotExists(_) => {
                api::ReservationError::NotExists.into()
            }
        })
    }
}

impl AsError for command::withdraw_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict => api::ReservationStateError::Contended.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotTutor(_) => api::PrivilegeError::NotTutor.into(),
            Self::NotWithdrawable(_) => Error {
                message: self.to_string(),
                ..api::ReservationStateError::InvalidTransition.into()
            },
            Self::ReservationNotExists(_) => {
                api::ReservationError::NotExists.into()
            }
        })
    }
}

impl AsError for command::submit_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict => api::ReservationStateError::Contended.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::Ineligible(e) => return e.try_as_error(),
            Self::ReservationNotExists(_) => {
                api::ReservationError::NotExists.into()
            }
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{create_reservation, submit_review, withdraw_reservation},
        domain::{
            reservation::{self, InvalidReservation, Status},
            review::gate::Ineligibility,
            user,
        },
    };

    use crate::AsError as _;

    #[test]
    fn maps_reservation_errors_to_codes() {
        use create_reservation::ExecutionError as E;

        let host = user::Id::new();
        for (err, code, status) in [
            (E::HostUnavailable(host), "HOST_UNAVAILABLE", 409),
            (E::HostNotBookable(host), "HOST_UNAVAILABLE", 409),
            (E::HostNotExists(host), "HOST_NOT_EXISTS", 404),
            (E::Conflict, "CONFLICT", 409),
            (E::Invalid(InvalidReservation::NoPets), "NO_PETS", 400),
            (
                E::Invalid(InvalidReservation::CapacityExceeded {
                    requested: 3,
                    capacity: 2,
                }),
                "CAPACITY_EXCEEDED",
                400,
            ),
        ] {
            let err = err.as_error();
            assert_eq!(err.code, code);
            assert_eq!(err.status_code.as_u16(), status);
        }
    }

    #[test]
    fn maps_review_errors_to_codes() {
        use submit_review::ExecutionError as E;

        let id = reservation::Id::new();
        let err = E::Ineligible(Ineligibility::AlreadyReviewed(id)).as_error();
        assert_eq!(err.code, "ALREADY_REVIEWED");
        assert_eq!(err.status_code.as_u16(), 409);

        let err =
            E::Ineligible(Ineligibility::NotCompleted(Status::Confirmada))
                .as_error();
        assert_eq!(err.code, "NOT_ELIGIBLE");
        assert_eq!(err.status_code.as_u16(), 403);

        let err = E::Ineligible(Ineligibility::NotParticipant(user::Id::new()))
            .as_error();
        assert_eq!(err.code, "FORBIDDEN");
    }

    #[test]
    fn decided_withdrawal_is_invalid_transition() {
        use withdraw_reservation::ExecutionError as E;

        let err = E::NotWithdrawable(Status::Confirmada).as_error();
        assert_eq!(err.code, "INVALID_TRANSITION");
        assert_eq!(err.status_code.as_u16(), 409);
    }
}
