//! Match: a best-of-N series between two teams.

use crate::models::tournament::{TeamId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Length of a series.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFormat {
    #[default]
    Bo1,
    Bo3,
    Bo5,
}

impl SeriesFormat {
    /// Game wins that decide the series.
    pub fn wins_needed(self) -> u32 {
        match self {
            SeriesFormat::Bo1 => 1,
            SeriesFormat::Bo3 => 2,
            SeriesFormat::Bo5 => 3,
        }
    }

    pub fn max_games(self) -> u32 {
        match self {
            SeriesFormat::Bo1 => 1,
            SeriesFormat::Bo3 => 3,
            SeriesFormat::Bo5 => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// A series between team1 (drafts blue) and team2 (drafts red).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub team1_name: String,
    pub team2_name: String,
    /// Bracket round, 1-based.
    pub round: u32,
    pub series_format: SeriesFormat,
    pub fearless_mode: bool,
    pub team1_wins: u32,
    pub team2_wins: u32,
    /// Game whose draft comes next (1-based).
    pub current_game: u32,
    pub winner_id: Option<TeamId>,
    pub status: MatchStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        team1: (TeamId, String),
        team2: (TeamId, String),
        round: u32,
        series_format: SeriesFormat,
        fearless_mode: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            team1_id: team1.0,
            team2_id: team2.0,
            team1_name: team1.1,
            team2_name: team2.1,
            round,
            series_format,
            fearless_mode,
            team1_wins: 0,
            team2_wins: 0,
            current_game: 1,
            winner_id: None,
            status: MatchStatus::Pending,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}
