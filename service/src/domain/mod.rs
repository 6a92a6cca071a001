//! Domain definitions.

pub mod availability;
pub mod host;
pub mod pet;
pub mod reservation;
pub mod review;
pub mod user;

pub use self::{
    host::Host, pet::Pet, reservation::Reservation, review::Review,
};
