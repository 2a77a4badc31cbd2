//! Champion select business logic: turn order, draft actions, fearless carryover, series.

mod draft;
mod fearless;
pub mod sequencer;
mod series;

pub use draft::{ban_champion, pick_champion, start_draft};
pub use fearless::fearless_bans;
pub use sequencer::{advance, phase_len, team_for_step, turn_order, Turn};
pub use series::record_game_winner;
