//! Draft actions: start, ban, pick. Each validates first and only then mutates.

use crate::logic::sequencer::{self, Turn};
use crate::models::{DraftError, DraftPhase, DraftSession, EMPTY_BAN, EMPTY_PICK};
use chrono::Utc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Action {
    Ban,
    Pick,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Action::Ban => "ban",
            Action::Pick => "pick",
        }
    }

    fn sentinel(self) -> &'static str {
        match self {
            Action::Ban => EMPTY_BAN,
            Action::Pick => EMPTY_PICK,
        }
    }

    fn allowed_in(self, phase: DraftPhase) -> bool {
        match self {
            Action::Ban => phase.is_ban(),
            Action::Pick => phase.is_pick(),
        }
    }
}

/// Start the draft: `waiting` -> `ban1`, blue to act.
pub fn start_draft(session: &mut DraftSession) -> Result<(), DraftError> {
    if session.phase != DraftPhase::Waiting {
        return Err(DraftError::invalid("start draft", session.phase));
    }
    apply_turn(session, sequencer::opening_turn());
    log::info!("draft {} started", session.id);
    Ok(())
}

/// Ban for the side to act. `None` (or a blank id) records `EMPTY_BAN`.
pub fn ban_champion(session: &mut DraftSession, champion: Option<&str>) -> Result<(), DraftError> {
    take_action(session, Action::Ban, champion)
}

/// Pick for the side to act. `None` (or a blank id) records `EMPTY_PICK`.
///
/// Rejects champions carried over by fearless rules and champions already banned or
/// picked in this draft.
pub fn pick_champion(session: &mut DraftSession, champion: Option<&str>) -> Result<(), DraftError> {
    take_action(session, Action::Pick, champion)
}

fn take_action(
    session: &mut DraftSession,
    action: Action,
    champion: Option<&str>,
) -> Result<(), DraftError> {
    let phase = session.phase;
    if !action.allowed_in(phase) {
        log::warn!("draft {}: {} rejected during {}", session.id, action.name(), phase);
        return Err(DraftError::invalid(action.name(), phase));
    }
    let (side, turn) = match (session.current_team, sequencer::advance(phase, session.phase_step)) {
        (Some(side), Some(turn)) => (side, turn),
        _ => return Err(DraftError::invalid(action.name(), phase)),
    };

    let champion = champion.map(str::trim).filter(|c| !c.is_empty());
    if let Some(c) = champion {
        if action == Action::Pick && session.fearless_banned_champions.contains(c) {
            log::warn!("draft {}: {} is fearless banned", session.id, c);
            return Err(DraftError::FearlessBanned(c.to_string()));
        }
        if session.is_taken(c) {
            return Err(DraftError::ChampionUnavailable(c.to_string()));
        }
    }
    let entry = champion.unwrap_or(action.sentinel()).to_string();

    log::debug!(
        "draft {}: {} {} {} (step {})",
        session.id,
        side,
        action.name(),
        entry,
        session.phase_step
    );
    match action {
        Action::Ban => session.bans_mut(side).push(entry),
        Action::Pick => session.picks_mut(side).push(entry),
    }
    apply_turn(session, turn);
    if session.phase != phase {
        log::info!("draft {}: {} -> {}", session.id, phase, session.phase);
    }
    Ok(())
}

fn apply_turn(session: &mut DraftSession, turn: Turn) {
    session.phase = turn.phase;
    session.phase_step = turn.step;
    session.current_team = turn.team;
    session.updated_at = Utc::now();
}
