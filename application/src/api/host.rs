//! [`Host`]-related definitions.

use common::Money;
use derive_more::From;
use juniper::graphql_object;
use service::{domain, query, Query as _};

use crate::{api, AsError, Context, Error};

/// A host offering pet-sitting.
#[derive(Clone, Debug, From)]
pub struct Host(domain::Host);

/// A host offering pet-sitting.
#[graphql_object(context = Context)]
impl Host {
    /// Unique identifier of the user acting as this `Host`.
    #[must_use]
    pub fn id(&self) -> api::user::Id {
        self.0.id.into()
    }

    /// Current price of a single day of stay for a single pet.
    #[must_use]
    pub fn daily_rate(&self) -> Money {
        self.0.daily_rate
    }

    /// Maximum number of pets accepted in a single `Reservation`.
    #[must_use]
    pub fn capacity(&self) -> i32 {
        u16::from(self.0.capacity).into()
    }

    /// `PetSpecies` this `Host` accepts.
    #[must_use]
    pub fn species(&self) -> Vec<api::pet::Species> {
        self.0.species.iter().cloned().map(Into::into).collect()
    }

    /// `PetSize` this `Host` accepts.
    #[must_use]
    pub fn size(&self) -> api::pet::Size {
        self.0.size.into()
    }

    /// Summary of the `Review`s written about this `Host`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Host.rating",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn rating(
        &self,
        ctx: &Context,
    ) -> Result<api::review::Summary, Error> {
        ctx.service()
            .execute(query::RatingOf(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}
