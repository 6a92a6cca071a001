//! [`Command`] definition.

pub mod advance_lifecycle;
pub mod authorize_session;
pub mod create_reservation;
pub mod respond_to_request;
pub mod retry;
pub mod submit_review;
pub mod withdraw_reservation;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    advance_lifecycle::AdvanceLifecycle,
    authorize_session::AuthorizeSession,
    create_reservation::CreateReservation,
    respond_to_request::{Decision, RespondToRequest},
    submit_review::SubmitReview,
    withdraw_reservation::WithdrawReservation,
};
