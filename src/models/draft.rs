//! DraftSession, DraftPhase and Side: the mutable state of one champion select.

use crate::models::series::MatchId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a draft session.
pub type DraftId = Uuid;

/// Recorded in a ban slot when a side lets its timer run out.
pub const EMPTY_BAN: &str = "EMPTY_BAN";

/// Recorded in a pick slot when a side lets its timer run out.
pub const EMPTY_PICK: &str = "EMPTY_PICK";

/// Seconds each side gets per action. Fixed for every phase and champion.
pub const ACTION_TIMER_SECS: u32 = 30;

/// Which side of the map a team drafts for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Blue => "blue",
            Side::Red => "red",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of the draft. Only ever moves forward, in declaration order.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DraftPhase {
    /// Created, not started yet.
    #[default]
    Waiting,
    Ban1,
    Pick1,
    Ban2,
    Pick2,
    /// Terminal: no further bans or picks.
    Completed,
}

impl DraftPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftPhase::Waiting => "waiting",
            DraftPhase::Ban1 => "ban1",
            DraftPhase::Pick1 => "pick1",
            DraftPhase::Ban2 => "ban2",
            DraftPhase::Pick2 => "pick2",
            DraftPhase::Completed => "completed",
        }
    }

    pub fn is_ban(self) -> bool {
        matches!(self, DraftPhase::Ban1 | DraftPhase::Ban2)
    }

    pub fn is_pick(self) -> bool {
        matches!(self, DraftPhase::Pick1 | DraftPhase::Pick2)
    }
}

impl std::fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial fields for a new draft session. Everything else starts empty.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDraftSession {
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
    #[serde(default)]
    pub match_id: Option<MatchId>,
    #[serde(default)]
    pub game_number: Option<u32>,
    #[serde(default)]
    pub tournament_name: Option<String>,
    #[serde(default)]
    pub blue_team_name: Option<String>,
    #[serde(default)]
    pub red_team_name: Option<String>,
    /// Filled in by the store from earlier games; never read from a request body.
    #[serde(skip)]
    pub fearless_banned_champions: BTreeSet<String>,
}

/// One game's champion select, or a standalone practice draft.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSession {
    pub id: DraftId,
    pub phase: DraftPhase,
    /// `None` while waiting and once completed.
    pub current_team: Option<Side>,
    /// Actions already taken within the current phase.
    pub phase_step: usize,
    pub blue_team_bans: Vec<String>,
    pub red_team_bans: Vec<String>,
    pub blue_team_picks: Vec<String>,
    pub red_team_picks: Vec<String>,
    /// Champions picked in earlier completed games of a fearless series.
    pub fearless_banned_champions: BTreeSet<String>,
    pub tournament_id: Option<TournamentId>,
    pub match_id: Option<MatchId>,
    pub game_number: u32,
    pub tournament_name: Option<String>,
    pub blue_team_name: Option<String>,
    pub red_team_name: Option<String>,
    pub timer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DraftSession {
    /// Create a session in `waiting` with empty bans and picks.
    pub fn new(init: NewDraftSession) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phase: DraftPhase::Waiting,
            current_team: None,
            phase_step: 0,
            blue_team_bans: Vec::new(),
            red_team_bans: Vec::new(),
            blue_team_picks: Vec::new(),
            red_team_picks: Vec::new(),
            fearless_banned_champions: init.fearless_banned_champions,
            tournament_id: init.tournament_id,
            match_id: init.match_id,
            game_number: init.game_number.unwrap_or(1),
            tournament_name: init.tournament_name,
            blue_team_name: init.blue_team_name,
            red_team_name: init.red_team_name,
            timer: ACTION_TIMER_SECS.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase == DraftPhase::Completed
    }

    pub fn bans_mut(&mut self, side: Side) -> &mut Vec<String> {
        match side {
            Side::Blue => &mut self.blue_team_bans,
            Side::Red => &mut self.red_team_bans,
        }
    }

    pub fn picks_mut(&mut self, side: Side) -> &mut Vec<String> {
        match side {
            Side::Blue => &mut self.blue_team_picks,
            Side::Red => &mut self.red_team_picks,
        }
    }

    /// Both sides' picks, blue first.
    pub fn all_picks(&self) -> impl Iterator<Item = &String> {
        self.blue_team_picks.iter().chain(self.red_team_picks.iter())
    }

    /// True if the champion already sits in any ban or pick slot of this session.
    pub fn is_taken(&self, champion: &str) -> bool {
        self.blue_team_bans
            .iter()
            .chain(self.red_team_bans.iter())
            .chain(self.all_picks())
            .any(|c| c == champion)
    }
}
