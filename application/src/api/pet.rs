//! Pet-related definitions.
//!
//! Pets are registered outside of this service, so only their IDs and
//! classification are exposed here.

use derive_more::{AsRef, Display, From, Into};
use juniper::{GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::api::scalar;

/// Unique identifier of a pet.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::pet::Id)]
#[into(domain::pet::Id)]
#[graphql(name = "PetId", transparent)]
pub struct Id(Uuid);

/// Species of a pet (`cachorro`, `gato`, etc).
///
/// Compared case-insensitively.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "PetSpecies", with = scalar::Via::<domain::pet::Species>)]
pub struct Species(domain::pet::Species);

/// Size category of pets.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PetSize")]
pub enum Size {
    /// Small pets.
    Small,

    /// Medium pets.
    Medium,

    /// Large pets.
    Large,
}

impl From<domain::pet::Size> for Size {
    fn from(size: domain::pet::Size) -> Self {
        use domain::pet::Size as S;
        match size {
            S::Small => Self::Small,
            S::Medium => Self::Medium,
            S::Large => Self::Large,
        }
    }
}

impl From<Size> for domain::pet::Size {
    fn from(size: Size) -> Self {
        match size {
            Size::Small => Self::Small,
            Size::Medium => Self::Medium,
            Size::Large => Self::Large,
        }
    }
}
