//! GraphQL API definitions.

pub mod host;
mod mutation;
pub mod pet;
mod query;
pub mod reservation;
pub mod review;
pub mod scalar;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    host::Host, mutation::Mutation, query::Query, reservation::Reservation,
    review::Review,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not a party of the `Reservation`"]
        NotParty,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the host of the `Reservation`"]
        NotHost,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the tutor of the \
                     `Reservation`"]
        NotTutor,
    }
}

define_error! {
    enum ReservationError {
        #[code = "RESERVATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Reservation` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "Stay must end after it starts"]
        Period,

        #[code = "INVALID_PETS_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "Number of pets must not be negative"]
        PetsCount,

        #[code = "INVALID_RATING"]
        #[status = BAD_REQUEST]
        #[message = "`ReviewRating` must be within 1..=5"]
        Rating,
    }
}

define_error! {
    enum HostError {
        #[code = "HOST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Host` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ReservationStateError {
        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "`Reservation` is busy with concurrent requests, try \
                     again later"]
        Contended,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Reservation` cannot move to the requested status"]
        InvalidTransition,
    }
}
