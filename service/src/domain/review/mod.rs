//! [`Review`] definitions.

pub mod gate;

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{accepts, to_sql_checked, FromSql, IsNull, ToSql, Type};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::{reservation, user};
#[cfg(doc)]
use crate::domain::Reservation;

/// Review left by one party of a [`Reservation`] about the other one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// ID of the reviewed [`Reservation`].
    pub reservation_id: reservation::Id,

    /// ID of the user who wrote this [`Review`].
    pub reviewer_id: user::Id,

    /// ID of the user this [`Review`] is about.
    pub reviewed_id: user::Id,

    /// [`Rating`] given.
    pub rating: Rating,

    /// Optional [`Comment`].
    pub comment: Option<Comment>,

    /// [`DateTime`] when this [`Review`] was written.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

/// ID of a [`Review`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
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

/// Number of stars of a [`Review`], from 1 to 5.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Rating(u8);

impl Rating {
    /// Lowest [`Rating`].
    pub const MIN: Self = Self(1);

    /// Highest [`Rating`].
    pub const MAX: Self = Self(5);

    /// Creates a new [`Rating`], if the provided `stars` are within range.
    #[must_use]
    pub fn new(stars: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&stars)
            .then_some(Self(stars))
    }
}

impl TryFrom<i32> for Rating {
    type Error = InvalidRating;

    fn try_from(stars: i32) -> Result<Self, Self::Error> {
        u8::try_from(stars)
            .ok()
            .and_then(Self::new)
            .ok_or(InvalidRating(stars))
    }
}

/// Error of a [`Rating`] out of range.
#[derive(Clone, Copy, Debug, Display, derive_more::Error, Eq, PartialEq)]
#[display("rating must be within 1..=5, got {_0}")]
pub struct InvalidRating(#[error(not(source))] pub i32);

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for Rating {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Self::try_from(i32::from(i16::from_sql(ty, raw)?)).map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Rating {
    accepts!(INT2);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        i16::from(self.0).to_sql(ty, w)
    }
}

/// Free-form text of a [`Review`].
///
/// Trimmed, non-empty and at most [`Comment::MAX_LEN`] characters long.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Comment(String);

impl Comment {
    /// Maximum number of characters in a [`Comment`].
    pub const MAX_LEN: usize = 1024;

    /// Creates a new [`Comment`] out of the provided `text`, if it's valid
    /// after trimming.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.chars().count() <= Self::MAX_LEN)
            .then(|| Self(text.to_owned()))
    }
}

impl std::str::FromStr for Comment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(
            "`Comment` must be non-empty and at most 1024 characters long",
        )
    }
}

/// Aggregated [`Rating`]s of a user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Summary {
    /// Average number of stars, rounded to 2 decimal places.
    ///
    /// Zero when there are no [`Review`]s.
    pub average: Decimal,

    /// Number of [`Review`]s.
    pub count: u64,
}

impl Summary {
    /// Summarizes the provided [`Review`]s.
    pub fn of<'r>(reviews: impl IntoIterator<Item = &'r Review>) -> Self {
        let (sum, count) = reviews
            .into_iter()
            .fold((0_u64, 0_u64), |(sum, count), r| {
                (sum + u64::from(r.rating.0), count + 1)
            });
        let average = if count == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(sum) / Decimal::from(count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self { average, count }
    }
}

/// [`DateTime`] of a [`Review`] creation.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::domain::{reservation, user};

    use super::{Comment, Id, Rating, Review, Summary};

    fn review(stars: u8) -> Review {
        Review {
            id: Id::new(),
            reservation_id: reservation::Id::new(),
            reviewer_id: user::Id::new(),
            reviewed_id: user::Id::new(),
            rating: Rating::new(stars).unwrap(),
            comment: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn rating_is_within_range() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        for stars in 1..=5 {
            assert_eq!(u8::from(Rating::new(stars).unwrap()), stars);
        }
        assert!(Rating::try_from(-1).is_err());
        assert!(Rating::try_from(256 + 3).is_err());
        assert_eq!(Rating::try_from(3), Ok(Rating::new(3).unwrap()));
    }

    #[test]
    fn comment_is_trimmed() {
        assert_eq!(Comment::new("  ótimo!  ").unwrap().as_ref(), "ótimo!");
        assert!(Comment::new("   ").is_none());
        assert!(Comment::new("a".repeat(Comment::MAX_LEN)).is_some());
        assert!(Comment::new("a".repeat(Comment::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn summarizes_ratings() {
        assert_eq!(
            Summary::of(&[]),
            Summary {
                average: Decimal::ZERO,
                count: 0,
            },
        );

        let reviews = [review(5), review(4), review(4)];
        let summary = Summary::of(&reviews);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, "4.33".parse::<Decimal>().unwrap());
    }
}
