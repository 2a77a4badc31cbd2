//! Fearless carryover: champions picked in earlier games of a series cannot be picked again.

use crate::models::{DraftSession, Match, EMPTY_PICK};
use std::collections::BTreeSet;

/// Champions ineligible for game `game_number` of `series`.
///
/// Union of every pick in completed sessions of the same match with a lower game number.
/// Bans are ignored. Empty when the match is not fearless or for game 1.
pub fn fearless_bans<'a>(
    series: &Match,
    game_number: u32,
    sessions: impl IntoIterator<Item = &'a DraftSession>,
) -> BTreeSet<String> {
    if !series.fearless_mode || game_number <= 1 {
        return BTreeSet::new();
    }
    sessions
        .into_iter()
        .filter(|s| s.match_id == Some(series.id))
        .filter(|s| s.game_number < game_number && s.is_completed())
        .flat_map(|s| s.all_picks())
        .filter(|c| c.as_str() != EMPTY_PICK)
        .cloned()
        .collect()
}
