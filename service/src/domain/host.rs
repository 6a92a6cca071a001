//! [`Host`] definitions.

use common::{define_kind, Money};
use derive_more::{Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{accepts, to_sql_checked, FromSql, IsNull, ToSql, Type};

#[cfg(doc)]
use crate::domain::Reservation;
use crate::domain::{
    pet::{Size, Species},
    user,
};

/// Directory record of a user offering pet-sitting.
///
/// Hosts are managed outside of this service and are read-only here.
#[derive(Clone, Debug, PartialEq)]
pub struct Host {
    /// ID of the [`user`] acting as this [`Host`].
    pub id: user::Id,

    /// Current price of a single day of stay for a single pet.
    pub daily_rate: Money,

    /// Maximum number of pets accepted in a single [`Reservation`].
    pub capacity: Capacity,

    /// [`Species`] this [`Host`] accepts.
    pub species: Vec<Species>,

    /// [`Size`] of pets this [`Host`] accepts.
    pub size: Size,

    /// [`Status`] of this [`Host`].
    pub status: Status,
}

impl Host {
    /// Indicates whether this [`Host`] accepts new [`Reservation`]s.
    #[must_use]
    pub fn is_bookable(&self) -> bool {
        matches!(self.status, Status::Active | Status::Available)
    }

    /// Indicates whether this [`Host`] accepts pets of the provided
    /// [`Species`].
    #[must_use]
    pub fn accepts(&self, species: &Species) -> bool {
        self.species.contains(species)
    }
}

/// Maximum number of pets per [`Reservation`], always at least one.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Capacity(u16);

impl Capacity {
    /// Creates a new [`Capacity`], if the provided `value` is positive.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Indicates whether the provided number of pets fits this [`Capacity`].
    #[must_use]
    pub fn fits(self, pets: usize) -> bool {
        pets <= usize::from(self.0)
    }
}

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for Capacity {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let v = u16::try_from(i16::from_sql(ty, raw)?)?;
        Self::new(v).ok_or_else(|| "`Capacity` must be positive".into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Capacity {
    accepts!(INT2);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        i16::try_from(self.0)?.to_sql(ty, w)
    }
}

define_kind! {
    #[doc = "Status of a [`Host`] in the directory."]
    enum Status {
        #[doc = "[`Host`] awaits moderation."]
        Pending = 1,

        #[doc = "[`Host`] is active."]
        Active = 2,

        #[doc = "[`Host`] is active and advertises free dates."]
        Available = 3,

        #[doc = "[`Host`] paused their activity."]
        Inactive = 4,

        #[doc = "[`Host`] is banned from the platform."]
        Banned = 5,
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        pet::{Size, Species},
        user,
    };

    use super::{Capacity, Host, Status};

    fn host(status: Status) -> Host {
        Host {
            id: user::Id::new(),
            daily_rate: Money {
                amount: Decimal::from(50),
                currency: Currency::Brl,
            },
            capacity: Capacity::new(2).unwrap(),
            species: vec![Species::new("cachorro").unwrap()],
            size: Size::Medium,
            status,
        }
    }

    #[test]
    fn capacity_is_positive() {
        assert!(Capacity::new(0).is_none());
        assert!(Capacity::new(1).unwrap().fits(1));
        assert!(!Capacity::new(2).unwrap().fits(3));
    }

    #[test]
    fn only_active_hosts_are_bookable() {
        assert!(host(Status::Active).is_bookable());
        assert!(host(Status::Available).is_bookable());
        assert!(!host(Status::Pending).is_bookable());
        assert!(!host(Status::Inactive).is_bookable());
        assert!(!host(Status::Banned).is_bookable());
    }

    #[test]
    fn accepts_normalized_species() {
        let host = host(Status::Active);

        assert!(host.accepts(&Species::new("Cachorro").unwrap()));
        assert!(!host.accepts(&Species::new("gato").unwrap()));
    }
}
