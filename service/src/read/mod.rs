//! Read entities definitions.

pub mod host;
pub mod reservation;
pub mod review;
