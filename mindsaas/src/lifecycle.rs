//! The PRD lifecycle state machine.
//!
//! A PRD instance moves forward along `PAY -> BUILD -> DELIVERED`, or from a
//! non-terminal state to `FAILED`. It never regresses. The transition
//! relation lives here and nowhere else: every component that mutates `state`
//! goes through [`crate::db::handlers::Prds::advance`] with one of the named
//! [`Transition`]s below, so the compare-and-swap guard is written once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Lifecycle state of a PRD instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PrdState {
    /// Awaiting payment confirmation.
    Pay,
    /// Paid; queued for the build pipeline.
    Build,
    /// Built and available at `delivered_url`.
    Delivered,
    /// Terminal failure.
    Failed,
}

impl PrdState {
    pub fn as_str(self) -> &'static str {
        match self {
            PrdState::Pay => "PAY",
            PrdState::Build => "BUILD",
            PrdState::Delivered => "DELIVERED",
            PrdState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PrdState::Delivered | PrdState::Failed)
    }

    /// The forward-only transition relation.
    pub fn can_transition_to(self, next: PrdState) -> bool {
        use PrdState::*;
        matches!((self, next), (Pay, Build) | (Build, Delivered)) || (!self.is_terminal() && next == Failed)
    }
}

impl fmt::Display for PrdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown PRD state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for PrdState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAY" => Ok(PrdState::Pay),
            "BUILD" => Ok(PrdState::Build),
            "DELIVERED" => Ok(PrdState::Delivered),
            "FAILED" => Ok(PrdState::Failed),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// A named edge in the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PrdState,
    pub to: PrdState,
}

/// Payment confirmed by the gateway webhook.
pub const PAYMENT_CONFIRMED: Transition = Transition {
    from: PrdState::Pay,
    to: PrdState::Build,
};

/// Build pipeline finished and the artifact is available.
pub const BUILD_COMPLETED: Transition = Transition {
    from: PrdState::Build,
    to: PrdState::Delivered,
};

/// Build pipeline gave up on this PRD.
pub const BUILD_FAILED: Transition = Transition {
    from: PrdState::Build,
    to: PrdState::Failed,
};

impl Transition {
    pub fn is_allowed(self) -> bool {
        self.from.can_transition_to(self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PrdState; 4] = [PrdState::Pay, PrdState::Build, PrdState::Delivered, PrdState::Failed];

    #[test]
    fn named_transitions_are_in_the_table() {
        assert!(PAYMENT_CONFIRMED.is_allowed());
        assert!(BUILD_COMPLETED.is_allowed());
        assert!(BUILD_FAILED.is_allowed());
    }

    #[test]
    fn forward_path_is_the_only_happy_path() {
        assert!(PrdState::Pay.can_transition_to(PrdState::Build));
        assert!(PrdState::Build.can_transition_to(PrdState::Delivered));
        assert!(!PrdState::Pay.can_transition_to(PrdState::Delivered));
    }

    #[test]
    fn non_terminal_states_may_fail() {
        assert!(PrdState::Pay.can_transition_to(PrdState::Failed));
        assert!(PrdState::Build.can_transition_to(PrdState::Failed));
        assert!(!PrdState::Delivered.can_transition_to(PrdState::Failed));
        assert!(!PrdState::Failed.can_transition_to(PrdState::Failed));
    }

    #[test]
    fn no_state_regresses() {
        for from in ALL {
            assert!(!from.can_transition_to(PrdState::Pay), "{from} -> PAY must be forbidden");
        }
        assert!(!PrdState::Delivered.can_transition_to(PrdState::Build));
        assert!(!PrdState::Failed.can_transition_to(PrdState::Build));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for from in [PrdState::Delivered, PrdState::Failed] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be forbidden");
            }
        }
    }

    #[test]
    fn parses_every_literal_it_prints() {
        for state in ALL {
            assert_eq!(state.as_str().parse::<PrdState>().unwrap(), state);
        }
    }

    #[test]
    fn rejects_unknown_literals() {
        assert!("CANCELLED".parse::<PrdState>().is_err());
        assert!("pay".parse::<PrdState>().is_err());
        assert!("".parse::<PrdState>().is_err());
    }
}
