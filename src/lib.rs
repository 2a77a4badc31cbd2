//! Champion select web app: library with draft models, turn-order logic and series tracking.

pub mod api;
pub mod auth;
pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use auth::{AccessCodes, AuthError, MemoryTokens, Subject, TokenIssuer};
pub use config::Config;
pub use logic::{
    ban_champion, fearless_bans, pick_champion, record_game_winner, start_draft,
};
pub use models::{
    DraftError, DraftId, DraftPhase, DraftSession, Match, MatchId, MatchStatus, NewDraftSession,
    SeriesFormat, Side, TeamEntry, TeamId, Tournament, TournamentId, ACTION_TIMER_SECS, EMPTY_BAN,
    EMPTY_PICK,
};
pub use store::DraftStore;
