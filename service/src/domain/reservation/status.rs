//! [`Status`] machine of a [`Reservation`].

use common::define_kind;
use derive_more::{Display, Error};

#[cfg(doc)]
use crate::domain::Reservation;

define_kind! {
    #[doc = "Lifecycle status of a [`Reservation`]."]
    #[case = "PascalCase"]
    enum Status {
        #[doc = "Requested by a tutor, awaiting the host's decision."]
        Pendente = 1,

        #[doc = "Accepted by the host."]
        Confirmada = 2,

        #[doc = "Refused by the host. Terminal."]
        Negada = 3,

        #[doc = "Stay is in progress."]
        EmAndamento = 4,

        #[doc = "Stay is over. Terminal."]
        Concluida = 5,
    }
}

impl Status {
    /// [`Status`]es blocking new overlapping [`Reservation`]s of the same
    /// host.
    pub const OCCUPYING: [Self; 3] =
        [Self::Pendente, Self::Confirmada, Self::EmAndamento];

    /// Indicates whether this [`Status`] blocks new overlapping
    /// [`Reservation`]s of the same host.
    #[must_use]
    pub const fn is_occupying(self) -> bool {
        matches!(self, Self::Pendente | Self::Confirmada | Self::EmAndamento)
    }

    /// Indicates whether no [`Transition`] leads out of this [`Status`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Negada | Self::Concluida)
    }

    /// Returns the [`Status`] the provided [`Transition`] leads to, if the
    /// [`Actor`] may perform it from this [`Status`].
    ///
    /// Date preconditions are not checked here.
    ///
    /// # Errors
    ///
    /// - [`Reason::WrongState`] if the [`Transition`] doesn't start at this
    ///   [`Status`].
    /// - [`Reason::Unauthorized`] if the [`Actor`] may not perform it.
    pub fn next(
        self,
        transition: Transition,
        actor: Actor,
    ) -> Result<Self, InvalidTransition> {
        use Transition as T;

        let (from, to) = match transition {
            T::Confirm => (Self::Pendente, Self::Confirmada),
            T::Deny => (Self::Pendente, Self::Negada),
            T::Start => (Self::Confirmada, Self::EmAndamento),
            T::Complete => (Self::EmAndamento, Self::Concluida),
        };
        if self != from {
            return Err(InvalidTransition {
                from: self,
                transition,
                reason: Reason::WrongState,
            });
        }
        if !transition.allows(actor) {
            return Err(InvalidTransition {
                from: self,
                transition,
                reason: Reason::Unauthorized,
            });
        }
        Ok(to)
    }
}

/// Named edge of the [`Status`] machine.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Transition {
    /// [`Status::Pendente`] to [`Status::Confirmada`].
    Confirm,

    /// [`Status::Pendente`] to [`Status::Negada`].
    Deny,

    /// [`Status::Confirmada`] to [`Status::EmAndamento`], once the stay has
    /// started.
    Start,

    /// [`Status::EmAndamento`] to [`Status::Concluida`], once the stay has
    /// ended.
    Complete,
}

impl Transition {
    /// All the [`Transition`]s.
    pub const ALL: [Self; 4] =
        [Self::Confirm, Self::Deny, Self::Start, Self::Complete];

    /// Indicates whether the provided [`Actor`] may perform this
    /// [`Transition`].
    #[must_use]
    pub const fn allows(self, actor: Actor) -> bool {
        match self {
            Self::Confirm | Self::Deny => matches!(actor, Actor::Host),
            Self::Start | Self::Complete => true,
        }
    }
}

/// Party requesting a [`Transition`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Actor {
    /// Host of the [`Reservation`].
    Host,

    /// Tutor of the [`Reservation`].
    Tutor,

    /// Housekeeping on behalf of nobody in particular.
    System,
}

/// Error of applying a [`Transition`] that is not legal.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("cannot {transition} `Reservation` in `{from}` status: {reason}")]
pub struct InvalidTransition {
    /// [`Status`] the [`Transition`] was attempted from.
    #[error(not(source))]
    pub from: Status,

    /// Attempted [`Transition`].
    #[error(not(source))]
    pub transition: Transition,

    /// [`Reason`] of the rejection.
    #[error(not(source))]
    pub reason: Reason,
}

/// Reason of an [`InvalidTransition`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Reason {
    /// [`Transition`] doesn't start at the current [`Status`].
    #[display("wrong state")]
    WrongState,

    /// [`Actor`] may not perform the [`Transition`].
    #[display("unauthorized actor")]
    Unauthorized,

    /// Date precondition of the [`Transition`] doesn't hold yet.
    #[display("too early")]
    Premature,
}

#[cfg(test)]
mod spec {
    use strum::IntoEnumIterator as _;

    use super::{Actor, Reason, Status, Transition};

    const ACTORS: [Actor; 3] = [Actor::Host, Actor::Tutor, Actor::System];

    #[test]
    fn serializes_wire_vocabulary() {
        let names = Status::iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(
            names,
            ["Pendente", "Confirmada", "Negada", "EmAndamento", "Concluida"],
        );
        assert_eq!("EmAndamento".parse::<Status>(), Ok(Status::EmAndamento));
    }

    #[test]
    fn terminal_states_have_no_way_out() {
        for from in [Status::Negada, Status::Concluida] {
            assert!(from.is_terminal());
            for transition in Transition::ALL {
                for actor in ACTORS {
                    let err = from.next(transition, actor).unwrap_err();
                    assert_eq!(err.from, from);
                    assert_eq!(err.reason, Reason::WrongState);
                }
            }
        }
    }

    #[test]
    fn only_host_decides() {
        for transition in [Transition::Confirm, Transition::Deny] {
            for actor in [Actor::Tutor, Actor::System] {
                let err = Status::Pendente.next(transition, actor).unwrap_err();
                assert_eq!(err.reason, Reason::Unauthorized);
            }
        }

        assert_eq!(
            Status::Pendente.next(Transition::Confirm, Actor::Host),
            Ok(Status::Confirmada),
        );
        assert_eq!(
            Status::Pendente.next(Transition::Deny, Actor::Host),
            Ok(Status::Negada),
        );
    }

    #[test]
    fn anyone_advances_the_stay() {
        for actor in ACTORS {
            assert_eq!(
                Status::Confirmada.next(Transition::Start, actor),
                Ok(Status::EmAndamento),
            );
            assert_eq!(
                Status::EmAndamento.next(Transition::Complete, actor),
                Ok(Status::Concluida),
            );
        }
    }

    #[test]
    fn rejects_skipping_states() {
        assert!(Status::Pendente
            .next(Transition::Start, Actor::System)
            .is_err());
        assert!(Status::Confirmada
            .next(Transition::Complete, Actor::System)
            .is_err());
        assert!(Status::Confirmada
            .next(Transition::Deny, Actor::Host)
            .is_err());
    }

    #[test]
    fn occupying_statuses() {
        for status in Status::iter() {
            assert_eq!(
                status.is_occupying(),
                Status::OCCUPYING.contains(&status),
            );
            assert!(!(status.is_occupying() && status.is_terminal()));
        }
    }
}
