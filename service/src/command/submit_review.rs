//! [`Command`] for submitting a [`Review`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation,
        review::{self, gate, Comment, Rating},
        user, Reservation, Review,
    },
    infra::{database, Database},
    Service,
};

use super::{
    retry::{Attempts, Contended},
    Command,
};

/// [`Command`] for one party of a completed [`Reservation`] to review the
/// other one.
#[derive(Clone, Debug)]
pub struct SubmitReview {
    /// ID of the reviewed [`Reservation`].
    pub reservation_id: reservation::Id,

    /// ID of the user writing the [`Review`].
    pub reviewer_id: user::Id,

    /// ID of the user the [`Review`] is about.
    pub reviewed_id: user::Id,

    /// [`Rating`] given.
    pub rating: Rating,

    /// Optional [`Comment`].
    pub comment: Option<Comment>,
}

impl<Db, Clk> Command<SubmitReview> for Service<Db, Clk>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Review>, reservation::Id>>,
            Ok = Vec<Review>,
            Err = Traced<database::Error>,
        > + Database<Insert<Review>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Review;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitReview {
            reservation_id,
            reviewer_id,
            reviewed_id,
            rating,
            comment,
        } = cmd;

        let mut attempts = Attempts::new(self.config().lock, "SubmitReview");
        loop {
            let res = async {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Serialize reviews of the same `Reservation`.
                tx.execute(Lock(By::<Reservation, _>::new(reservation_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                let reservation = tx
                    .execute(Select(By::<Option<Reservation>, _>::new(
                        reservation_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::ReservationNotExists(reservation_id))
                    .map_err(tracerr::wrap!())?;
                let existing = tx
                    .execute(Select(By::<Vec<Review>, _>::new(reservation_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                gate::check(&reservation, reviewer_id, reviewed_id, &existing)
                    .map_err(tracerr::from_and_wrap!(=> E))?;

                let review = Review {
                    id: review::Id::new(),
                    reservation_id,
                    reviewer_id,
                    reviewed_id,
                    rating,
                    comment: comment.clone(),
                    created_at: DateTime::now().coerce(),
                };
                tx.execute(Insert(review.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                Ok::<_, Traced<E>>(review)
            }
            .await;

            if let Some(res) = attempts.settle(res).await {
                let review = res.map_err(|e| {
                    if e.as_ref().is_duplicate() {
                        tracerr::new!(E::Ineligible(
                            gate::Ineligibility::AlreadyReviewed(
                                reservation_id
                            )
                        ))
                    } else {
                        e
                    }
                })?;
                log::info!(
                    "`Review(id: {})` of `Reservation(id: {reservation_id})` \
                     submitted",
                    review.id,
                );
                break Ok(review);
            }
        }
    }
}

/// Error of [`SubmitReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Locks kept being held by concurrent transactions.
    #[display("`Reservation` is busy with concurrent requests, try again later")]
    Conflict,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Reviewer may not write the [`Review`].
    #[display("Cannot review: {_0}")]
    #[from]
    Ineligible(gate::Ineligibility),

    /// [`Reservation`] with the provided ID does not exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    ReservationNotExists(#[error(not(source))] reservation::Id),
}

impl ExecutionError {
    /// Indicates whether this [`ExecutionError`] is caused by a concurrent
    /// submission of the same [`Review`].
    fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::Db(e) if e.is_unique_violation(Some(database::UNIQUE_REVIEW)),
        )
    }
}

impl Contended for ExecutionError {
    fn is_contended(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_contended())
    }

    fn exhausted() -> Self {
        Self::Conflict
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::{
            AdvanceLifecycle, Command as _, CreateReservation, Decision,
            RespondToRequest,
        },
        domain::{
            reservation::Status,
            review::{gate::Ineligibility, Comment, Rating},
            user, Reservation,
        },
        fixture::{self, date, TestService},
        infra::clock::Fixed,
        query::{reviews, CanReview, Query as _, RatingOf},
    };

    use super::{ExecutionError as E, SubmitReview};

    async fn completed(svc: &TestService, clock: &Fixed) -> Reservation {
        let host = fixture::host(svc).await;
        let reservation =
            fixture::reservation(svc, &host, "2025-02-01", "2025-02-04").await;
        _ = svc
            .execute(RespondToRequest {
                reservation_id: reservation.id(),
                host_id: host.id,
                decision: Decision::Confirm,
            })
            .await
            .unwrap();
        clock.set(date("2025-02-04"));
        svc.execute(AdvanceLifecycle {
            reservation_id: reservation.id(),
            initiator_id: None,
        })
        .await
        .unwrap()
    }

    fn review(
        reservation: &Reservation,
        reviewer_id: user::Id,
        stars: u8,
    ) -> SubmitReview {
        SubmitReview {
            reservation_id: reservation.id(),
            reviewer_id,
            reviewed_id: reservation.counterpart(reviewer_id).unwrap(),
            rating: Rating::new(stars).unwrap(),
            comment: Comment::new("Tudo certo"),
        }
    }

    #[tokio::test]
    async fn books_stays_and_reviews_end_to_end() {
        let (svc, clock) = fixture::service().await;
        let host = fixture::host(&svc).await;
        let tutor = user::Id::new();
        let pets = vec![
            fixture::pet(&svc, tutor, "cachorro").await,
            fixture::pet(&svc, tutor, "gato").await,
        ];

        let reservation = svc
            .execute(CreateReservation {
                tutor_id: tutor,
                host_id: host.id,
                pet_ids: pets,
                start: date("2025-02-01"),
                end: date("2025-02-04"),
            })
            .await
            .unwrap();
        assert_eq!(reservation.status(), Status::Pendente);
        assert_eq!(reservation.total().to_string(), "300BRL");

        let confirmed = svc
            .execute(RespondToRequest {
                reservation_id: reservation.id(),
                host_id: host.id,
                decision: Decision::Confirm,
            })
            .await
            .unwrap();
        assert_eq!(confirmed.status(), Status::Confirmada);

        let advance = AdvanceLifecycle {
            reservation_id: reservation.id(),
            initiator_id: Some(tutor),
        };
        clock.set(date("2025-02-02"));
        let started = svc.execute(advance).await.unwrap();
        assert_eq!(started.status(), Status::EmAndamento);

        let err = svc.execute(review(&started, tutor, 5)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::Ineligible(Ineligibility::NotCompleted(Status::EmAndamento)),
        ));

        clock.set(date("2025-02-05"));
        let completed = svc.execute(advance).await.unwrap();
        assert_eq!(completed.status(), Status::Concluida);

        assert!(svc
            .execute(CanReview {
                reservation_id: completed.id(),
                reviewer_id: tutor,
                reviewed_id: None,
            })
            .await
            .unwrap());
        _ = svc.execute(review(&completed, tutor, 5)).await.unwrap();
        _ = svc.execute(review(&completed, host.id, 4)).await.unwrap();

        for reviewer in [tutor, host.id] {
            assert!(!svc
                .execute(CanReview {
                    reservation_id: completed.id(),
                    reviewer_id: reviewer,
                    reviewed_id: None,
                })
                .await
                .unwrap());
        }

        let reviews = svc
            .execute(reviews::ForReservation::by(completed.id()))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 2);

        let rating = svc.execute(RatingOf(host.id)).await.unwrap();
        assert_eq!(rating.count, 1);
        assert_eq!(rating.average, Decimal::from(5));
    }

    #[tokio::test]
    async fn accepts_single_review_per_reviewer() {
        let (svc, clock) = fixture::service().await;
        let reservation = completed(&svc, &clock).await;
        let tutor = reservation.tutor_id();

        _ = svc.execute(review(&reservation, tutor, 5)).await.unwrap();

        let err = svc.execute(review(&reservation, tutor, 3)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::Ineligible(Ineligibility::AlreadyReviewed(id))
                if *id == reservation.id(),
        ));

        let host = reservation.host_id();
        let by_host = svc.execute(review(&reservation, host, 3)).await.unwrap();
        assert_eq!(by_host.reviewed_id, tutor);
    }

    #[tokio::test]
    async fn rejects_reviews_outside_the_stay() {
        let (svc, clock) = fixture::service().await;
        let reservation = completed(&svc, &clock).await;
        let tutor = reservation.tutor_id();

        let err = svc
            .execute(SubmitReview {
                reviewed_id: tutor,
                ..review(&reservation, tutor, 5)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::Ineligible(Ineligibility::NotCounterpart(_)),
        ));

        let stranger = user::Id::new();
        let err = svc
            .execute(SubmitReview {
                reviewer_id: stranger,
                ..review(&reservation, tutor, 5)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            E::Ineligible(Ineligibility::NotParticipant(id)) if *id == stranger,
        ));
    }
}
