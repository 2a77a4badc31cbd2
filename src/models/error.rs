//! Errors returned by draft and series operations.

use crate::models::draft::{DraftPhase, Side};
use uuid::Uuid;

/// Failures of draft, series and store operations. None of these are transient.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// Referenced record does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    /// Operation not legal in the current phase (or on a finished match).
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: String },
    /// Champion was picked in an earlier game of this fearless series.
    #[error("{0} was already picked earlier in this fearless series")]
    FearlessBanned(String),
    /// Champion already occupies a ban or pick slot in this draft.
    #[error("{0} is already banned or picked in this draft")]
    ChampionUnavailable(String),
    /// Declared winner is neither team of the match.
    #[error("team {0} is not playing in this match")]
    InvalidWinner(Uuid),
    /// Caller may not act for the side that is up (or for this draft at all).
    #[error("{}", out_of_turn_message(*.0))]
    OutOfTurn(Option<Side>),
    /// Both sides of a match are the same team.
    #[error("team {0} cannot play itself")]
    SelfMatch(Uuid),
    /// Game number outside 1..=max games of the series.
    #[error("game {game} is out of range for a best-of-{max} series")]
    InvalidGameNumber { game: u32, max: u32 },
}

fn out_of_turn_message(up: Option<Side>) -> String {
    match up {
        Some(side) => format!("not allowed to act for {side} in this draft"),
        None => "not allowed to act in this draft".to_string(),
    }
}

impl DraftError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        DraftError::NotFound { kind, id }
    }

    pub(crate) fn invalid(action: &'static str, phase: DraftPhase) -> Self {
        DraftError::InvalidTransition {
            action,
            phase: phase.to_string(),
        }
    }
}
