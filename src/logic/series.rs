//! Series progression: count game wins and decide a best-of-N match.

use crate::models::{DraftError, Match, MatchStatus, TeamId};
use chrono::{DateTime, Utc};

/// Record the winner of the current game.
///
/// Bumps the winner's tally and `current_game`. Once a side reaches the wins needed for
/// the format, the match is completed with that side as winner at `now`.
pub fn record_game_winner(
    series: &mut Match,
    winner: TeamId,
    now: DateTime<Utc>,
) -> Result<(), DraftError> {
    if series.is_completed() {
        return Err(DraftError::InvalidTransition {
            action: "record a game winner",
            phase: "completed".to_string(),
        });
    }
    let is_team1 = if winner == series.team1_id {
        true
    } else if winner == series.team2_id {
        false
    } else {
        return Err(DraftError::InvalidWinner(winner));
    };

    if is_team1 {
        series.team1_wins += 1;
    } else {
        series.team2_wins += 1;
    }
    series.current_game += 1;

    let needed = series.series_format.wins_needed();
    if series.team1_wins >= needed || series.team2_wins >= needed {
        series.status = MatchStatus::Completed;
        series.winner_id = Some(winner);
        series.completed_at = Some(now);
        log::info!(
            "match {} won by {} ({}-{})",
            series.id,
            winner,
            series.team1_wins,
            series.team2_wins
        );
    } else {
        series.status = MatchStatus::InProgress;
        log::debug!(
            "match {}: {}-{}, game {} next",
            series.id,
            series.team1_wins,
            series.team2_wins,
            series.current_game
        );
    }
    Ok(())
}
