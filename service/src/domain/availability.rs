//! Matching of [`Host`]s against a requested [`Period`].

use std::collections::HashMap;

use crate::domain::{
    pet::{Size, Species},
    reservation::{Period, Status},
    user, Host, Reservation,
};

/// Something occupying (or not) a [`Host`] for a [`Period`].
pub trait Occupancy {
    /// Returns the [`Period`] this [`Occupancy`] spans.
    fn period(&self) -> Period;

    /// Returns the [`Status`] of this [`Occupancy`].
    fn status(&self) -> Status;
}

impl Occupancy for Reservation {
    fn period(&self) -> Period {
        Reservation::period(self)
    }

    fn status(&self) -> Status {
        Reservation::status(self)
    }
}

impl Occupancy for (Period, Status) {
    fn period(&self) -> Period {
        self.0
    }

    fn status(&self) -> Status {
        self.1
    }
}

impl<T: Occupancy + ?Sized> Occupancy for &T {
    fn period(&self) -> Period {
        (**self).period()
    }

    fn status(&self) -> Status {
        (**self).status()
    }
}

/// Indicates whether none of the `existing` occupying [`Status`]es overlaps
/// the `candidate` [`Period`].
pub fn is_available<O: Occupancy>(
    existing: impl IntoIterator<Item = O>,
    candidate: &Period,
) -> bool {
    !existing
        .into_iter()
        .any(|o| o.status().is_occupying() && o.period().overlaps(candidate))
}

/// Constraints on [`Host`]s to look for.
///
/// An empty list means no constraint.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    /// [`Species`], at least one of which a [`Host`] must accept.
    pub species: Vec<Species>,

    /// [`Size`]s, one of which a [`Host`] must accept.
    pub sizes: Vec<Size>,
}

impl Filter {
    /// Indicates whether the provided [`Host`] satisfies this [`Filter`].
    #[must_use]
    pub fn matches(&self, host: &Host) -> bool {
        (self.species.is_empty() || self.species.iter().any(|s| host.accepts(s)))
            && (self.sizes.is_empty() || self.sizes.contains(&host.size))
    }
}

/// Keeps the [`Host`]s satisfying the [`Filter`] and available for the
/// provided [`Period`], preserving their order.
///
/// `reservations` are grouped by [`Host`] ID. A [`Host`] missing there has
/// nothing booked.
#[must_use]
pub fn filter_hosts<O: Occupancy>(
    hosts: impl IntoIterator<Item = Host>,
    reservations: &HashMap<user::Id, Vec<O>>,
    period: &Period,
    filter: &Filter,
) -> Vec<Host> {
    hosts
        .into_iter()
        .filter(|h| filter.matches(h))
        .filter(|h| {
            reservations
                .get(&h.id)
                .map_or(true, |booked| is_available(booked, period))
        })
        .collect()
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        host::{self, Capacity},
        pet::{Size, Species},
        reservation::{Period, Status},
        user, Host,
    };

    use super::{filter_hosts, is_available, Filter};

    fn period(start: &str, end: &str) -> Period {
        Period::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    fn host(species: &[&str], size: Size) -> Host {
        Host {
            id: user::Id::new(),
            daily_rate: Money {
                amount: Decimal::from(60),
                currency: Currency::Brl,
            },
            capacity: Capacity::new(3).unwrap(),
            species: species.iter().map(|s| Species::new(s).unwrap()).collect(),
            size,
            status: host::Status::Active,
        }
    }

    #[test]
    fn touching_ranges_do_not_conflict() {
        let existing = [(period("2025-01-01", "2025-01-05"), Status::Confirmada)];

        assert!(is_available(&existing, &period("2025-01-05", "2025-01-08")));
    }

    #[test]
    fn strict_overlap_conflicts() {
        let existing = [(period("2025-01-01", "2025-01-05"), Status::Pendente)];

        assert!(!is_available(&existing, &period("2025-01-03", "2025-01-06")));
    }

    #[test]
    fn only_occupying_statuses_conflict() {
        let booked = period("2025-01-01", "2025-01-05");
        let candidate = period("2025-01-02", "2025-01-03");

        for (status, available) in [
            (Status::Pendente, false),
            (Status::Confirmada, false),
            (Status::EmAndamento, false),
            (Status::Negada, true),
            (Status::Concluida, true),
        ] {
            assert_eq!(
                is_available([(booked, status)], &candidate),
                available,
                "{status}",
            );
        }
        assert!(is_available(Vec::<(Period, Status)>::new(), &candidate));
    }

    #[test]
    fn filters_hosts_by_availability_and_traits() {
        let dogs = host(&["cachorro"], Size::Large);
        let cats = host(&["gato"], Size::Small);
        let both = host(&["gato", "cachorro"], Size::Medium);
        let wanted = period("2025-03-10", "2025-03-12");

        let mut booked = HashMap::new();
        _ = booked.insert(
            both.id,
            vec![(period("2025-03-11", "2025-03-15"), Status::Confirmada)],
        );
        _ = booked.insert(
            cats.id,
            vec![(period("2025-03-01", "2025-03-10"), Status::EmAndamento)],
        );
        let hosts = || vec![dogs.clone(), cats.clone(), both.clone()];

        let ids = |hosts: Vec<Host>| hosts.iter().map(|h| h.id).collect::<Vec<_>>();

        assert_eq!(
            ids(filter_hosts(hosts(), &booked, &wanted, &Filter::default())),
            [dogs.id, cats.id],
        );
        assert_eq!(
            ids(filter_hosts(
                hosts(),
                &booked,
                &wanted,
                &Filter {
                    species: vec![Species::new("Gato").unwrap()],
                    sizes: vec![],
                },
            )),
            [cats.id],
        );
        assert_eq!(
            ids(filter_hosts(
                hosts(),
                &HashMap::<_, Vec<(Period, Status)>>::new(),
                &wanted,
                &Filter {
                    species: vec![],
                    sizes: vec![Size::Medium, Size::Large],
                },
            )),
            [dogs.id, both.id],
        );
    }
}
