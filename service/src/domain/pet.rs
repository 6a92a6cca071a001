//! [`Pet`] definitions.

use std::sync::LazyLock;

use common::define_kind;
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Host;
use crate::domain::user;

/// Pet owned by a tutor.
///
/// Pets are managed outside of this service and are read-only here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pet {
    /// ID of this [`Pet`].
    pub id: Id,

    /// ID of the tutor owning this [`Pet`].
    pub tutor_id: user::Id,

    /// [`Species`] of this [`Pet`].
    pub species: Species,
}

/// ID of a [`Pet`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Species of a [`Pet`] (`cachorro`, `gato`, etc).
///
/// Always stored trimmed and lowercased, so comparing two [`Species`] is
/// case-insensitive.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Species(String);

impl Species {
    /// Normalizes the given `name` and creates a new [`Species`] out of it,
    /// if it's valid.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim().to_lowercase();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given normalized `name` is a valid [`Species`].
    fn check(name: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Species`] invariants:
        /// - Must start with a lowercase letter;
        /// - Must contain only lowercase letters, digits, spaces or dashes;
        /// - Must be between 1 and 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\p{Ll}[\p{Ll}\p{N} \-]{0,63}$").expect("valid regex")
        });

        REGEX.is_match(name.as_ref())
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Species`")
    }
}

define_kind! {
    #[doc = "Size category of a [`Pet`] accepted by a [`Host`]."]
    enum Size {
        #[doc = "Small pets."]
        Small = 1,

        #[doc = "Medium pets."]
        Medium = 2,

        #[doc = "Large pets."]
        Large = 3,
    }
}

#[cfg(test)]
mod spec {
    use super::Species;

    #[test]
    fn normalizes_species() {
        assert_eq!(
            Species::new("  Cachorro ").unwrap().to_string(),
            "cachorro",
        );
        assert_eq!(Species::new("GATO"), Species::new("gato"));
        assert_eq!(
            Species::new("Pássaro-Preto").unwrap().to_string(),
            "pássaro-preto",
        );
    }

    #[test]
    fn rejects_invalid_species() {
        assert!(Species::new("").is_none());
        assert!(Species::new("   ").is_none());
        assert!(Species::new("1gato").is_none());
        assert!(Species::new("gato!").is_none());
        assert!(Species::new("g".repeat(65)).is_none());
        assert!(Species::new("g".repeat(64)).is_some());
    }
}
