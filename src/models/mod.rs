//! Data structures for champion select: draft sessions, series matches, tournaments.

mod draft;
mod error;
mod series;
mod tournament;

pub use draft::{
    DraftId, DraftPhase, DraftSession, NewDraftSession, Side, ACTION_TIMER_SECS, EMPTY_BAN,
    EMPTY_PICK,
};
pub use error::DraftError;
pub use series::{Match, MatchId, MatchStatus, SeriesFormat};
pub use tournament::{TeamEntry, TeamId, Tournament, TournamentId};
