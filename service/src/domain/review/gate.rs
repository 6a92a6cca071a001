//! Eligibility of writing a [`Review`].

use derive_more::{Display, Error};

use crate::domain::{
    reservation::{self, Status},
    user, Reservation,
};

use super::Review;

/// Reason a user may not write a [`Review`] about a [`Reservation`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Ineligibility {
    /// [`Reservation`] is not [`Status::Concluida`] yet.
    #[display("`Reservation` is `{_0}`, not `Concluida`")]
    NotCompleted(#[error(not(source))] Status),

    /// Reviewer is not a party of the [`Reservation`].
    #[display("`User(id: {_0})` is not a party of the `Reservation`")]
    NotParticipant(#[error(not(source))] user::Id),

    /// Reviewed user is not the other party of the [`Reservation`].
    #[display("`User(id: {_0})` is not the counterpart of the reviewer")]
    NotCounterpart(#[error(not(source))] user::Id),

    /// Reviewer has already reviewed the [`Reservation`].
    #[display("`Reservation(id: {_0})` is already reviewed by the user")]
    AlreadyReviewed(#[error(not(source))] reservation::Id),
}

/// Checks whether the `reviewer` may write a [`Review`] about the `reviewed`
/// user for the provided [`Reservation`], given its `existing` [`Review`]s.
///
/// # Errors
///
/// With the first [`Ineligibility`] found.
pub fn check<'r>(
    reservation: &Reservation,
    reviewer: user::Id,
    reviewed: user::Id,
    existing: impl IntoIterator<Item = &'r Review>,
) -> Result<(), Ineligibility> {
    use Ineligibility as E;

    if reservation.status() != Status::Concluida {
        return Err(E::NotCompleted(reservation.status()));
    }
    let counterpart = reservation
        .counterpart(reviewer)
        .ok_or(E::NotParticipant(reviewer))?;
    if counterpart != reviewed {
        return Err(E::NotCounterpart(reviewed));
    }
    if existing.into_iter().any(|r| {
        r.reservation_id == reservation.id() && r.reviewer_id == reviewer
    }) {
        return Err(E::AlreadyReviewed(reservation.id()));
    }
    Ok(())
}

/// Indicates whether the `reviewer` may write a [`Review`] about the
/// `reviewed` user for the provided [`Reservation`].
#[must_use]
pub fn can_review<'r>(
    reservation: &Reservation,
    reviewer: user::Id,
    reviewed: user::Id,
    existing: impl IntoIterator<Item = &'r Review>,
) -> bool {
    check(reservation, reviewer, reviewed, existing).is_ok()
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        host::{self, Capacity},
        pet::{self, Size},
        reservation::{self, Period, Status},
        review::{self, Rating},
        user, Host, Reservation, Review,
    };

    use super::{can_review, check, Ineligibility};

    fn reservation(status: Status) -> Reservation {
        let host = Host {
            id: user::Id::new(),
            daily_rate: Money {
                amount: Decimal::from(50),
                currency: Currency::Brl,
            },
            capacity: Capacity::new(1).unwrap(),
            species: vec![],
            size: Size::Small,
            status: host::Status::Active,
        };
        Reservation::restore(
            reservation::Id::new(),
            user::Id::new(),
            host.id,
            Period::new(
                "2025-02-01".parse().unwrap(),
                "2025-02-04".parse().unwrap(),
            )
            .unwrap(),
            vec![pet::Id::new()],
            host.daily_rate,
            host.daily_rate,
            status,
            DateTime::now().coerce(),
        )
    }

    fn review(res: &Reservation, reviewer: user::Id) -> Review {
        Review {
            id: review::Id::new(),
            reservation_id: res.id(),
            reviewer_id: reviewer,
            reviewed_id: res.counterpart(reviewer).unwrap(),
            rating: Rating::MAX,
            comment: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn requires_completed_reservation() {
        for status in [
            Status::Pendente,
            Status::Confirmada,
            Status::Negada,
            Status::EmAndamento,
        ] {
            let res = reservation(status);

            assert_eq!(
                check(&res, res.tutor_id(), res.host_id(), &[]),
                Err(Ineligibility::NotCompleted(status)),
            );
        }
    }

    #[test]
    fn both_parties_review_each_other() {
        let res = reservation(Status::Concluida);

        assert!(can_review(&res, res.tutor_id(), res.host_id(), &[]));
        assert!(can_review(&res, res.host_id(), res.tutor_id(), &[]));
    }

    #[test]
    fn rejects_outsiders_and_self_reviews() {
        let res = reservation(Status::Concluida);
        let stranger = user::Id::new();

        assert_eq!(
            check(&res, stranger, res.host_id(), &[]),
            Err(Ineligibility::NotParticipant(stranger)),
        );
        assert_eq!(
            check(&res, res.tutor_id(), res.tutor_id(), &[]),
            Err(Ineligibility::NotCounterpart(res.tutor_id())),
        );
        assert_eq!(
            check(&res, res.tutor_id(), stranger, &[]),
            Err(Ineligibility::NotCounterpart(stranger)),
        );
    }

    #[test]
    fn one_review_per_party() {
        let res = reservation(Status::Concluida);
        let existing = [review(&res, res.tutor_id())];

        assert_eq!(
            check(&res, res.tutor_id(), res.host_id(), &existing),
            Err(Ineligibility::AlreadyReviewed(res.id())),
        );
        assert!(can_review(&res, res.host_id(), res.tutor_id(), &existing));
    }
}
