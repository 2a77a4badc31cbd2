//! In-memory records for tournaments, teams, matches and draft sessions.
//!
//! Every draft session and match sits behind its own mutex, so two requests racing on the
//! same record (a timeout auto-ban and a captain's ban, say) are applied one after the
//! other. Mutations run on a copy that is only written back on success.

use crate::auth::Subject;
use crate::logic;
use crate::models::{
    DraftError, DraftId, DraftSession, Match, MatchId, MatchStatus, NewDraftSession,
    SeriesFormat, Side, TeamEntry, TeamId, Tournament, TournamentId,
};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

type Shared<T> = Arc<Mutex<T>>;

#[derive(Default)]
pub struct DraftStore {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    teams: RwLock<HashMap<TeamId, TeamEntry>>,
    matches: RwLock<HashMap<MatchId, Shared<Match>>>,
    drafts: RwLock<HashMap<DraftId, Shared<DraftSession>>>,
    /// Draft session created for each (match, game number).
    games: RwLock<HashMap<(MatchId, u32), DraftId>>,
}

// Records are only written back after a successful operation, so a poisoned lock still
// guards consistent data.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `subject` must be allowed to act for the side that is up. Before the first and after
/// the last action any side of this draft will do.
fn check_turn(session: &DraftSession, subject: &Subject) -> Result<(), DraftError> {
    let allowed = match session.current_team {
        Some(up) => subject.may_act(session.id, up),
        None => [Side::Blue, Side::Red]
            .into_iter()
            .any(|side| subject.may_act(session.id, side)),
    };
    if allowed {
        Ok(())
    } else {
        Err(DraftError::OutOfTurn(session.current_team))
    }
}

/// Apply `f` to a copy of the record and store it only if `f` succeeds.
fn update<T: Clone>(
    record: &Mutex<T>,
    f: impl FnOnce(&mut T) -> Result<(), DraftError>,
) -> Result<T, DraftError> {
    let mut guard = lock(record);
    let mut next = guard.clone();
    f(&mut next)?;
    *guard = next.clone();
    Ok(next)
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- tournaments and teams ---

    pub fn create_tournament(&self, name: impl Into<String>) -> Tournament {
        let tournament = Tournament::new(name);
        write(&self.tournaments).insert(tournament.id, tournament.clone());
        log::info!("created tournament {} ({})", tournament.name, tournament.id);
        tournament
    }

    pub fn get_tournament(&self, id: TournamentId) -> Result<Tournament, DraftError> {
        read(&self.tournaments)
            .get(&id)
            .cloned()
            .ok_or(DraftError::not_found("tournament", id))
    }

    pub fn add_team(
        &self,
        tournament_id: TournamentId,
        name: impl Into<String>,
    ) -> Result<TeamEntry, DraftError> {
        self.get_tournament(tournament_id)?;
        let team = TeamEntry::new(tournament_id, name);
        write(&self.teams).insert(team.id, team.clone());
        Ok(team)
    }

    pub fn get_team(&self, id: TeamId) -> Result<TeamEntry, DraftError> {
        read(&self.teams)
            .get(&id)
            .cloned()
            .ok_or(DraftError::not_found("team", id))
    }

    /// Teams of a tournament, by name.
    pub fn list_teams(&self, tournament_id: TournamentId) -> Vec<TeamEntry> {
        let mut teams: Vec<_> = read(&self.teams)
            .values()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    // --- matches ---

    /// Create a series between two teams of the tournament. team1 drafts blue.
    pub fn create_match(
        &self,
        tournament_id: TournamentId,
        team1_id: TeamId,
        team2_id: TeamId,
        round: u32,
        series_format: SeriesFormat,
        fearless_mode: bool,
    ) -> Result<Match, DraftError> {
        self.get_tournament(tournament_id)?;
        if team1_id == team2_id {
            return Err(DraftError::SelfMatch(team1_id));
        }
        let team1 = self.team_in(tournament_id, team1_id)?;
        let team2 = self.team_in(tournament_id, team2_id)?;
        let m = Match::new(
            tournament_id,
            (team1.id, team1.name),
            (team2.id, team2.name),
            round.max(1),
            series_format,
            fearless_mode,
        );
        write(&self.matches).insert(m.id, Arc::new(Mutex::new(m.clone())));
        log::info!(
            "created {:?} match {} ({} vs {}, fearless: {})",
            m.series_format,
            m.id,
            m.team1_name,
            m.team2_name,
            m.fearless_mode
        );
        Ok(m)
    }

    fn team_in(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<TeamEntry, DraftError> {
        self.get_team(team_id)
            .ok()
            .filter(|t| t.tournament_id == tournament_id)
            .ok_or(DraftError::not_found("team", team_id))
    }

    fn match_record(&self, id: MatchId) -> Result<Shared<Match>, DraftError> {
        read(&self.matches)
            .get(&id)
            .cloned()
            .ok_or(DraftError::not_found("match", id))
    }

    pub fn get_match(&self, id: MatchId) -> Result<Match, DraftError> {
        let record = self.match_record(id)?;
        let m = lock(&record).clone();
        Ok(m)
    }

    /// Matches of a tournament, ordered by round.
    pub fn list_matches(&self, tournament_id: TournamentId) -> Vec<Match> {
        let records: Vec<_> = read(&self.matches).values().cloned().collect();
        let mut matches: Vec<Match> = records
            .iter()
            .map(|r| lock(r).clone())
            .filter(|m| m.tournament_id == tournament_id)
            .collect();
        matches.sort_by_key(|m| m.round);
        matches
    }

    /// Record the winner of the match's current game and update the series score.
    pub fn record_game_winner(
        &self,
        match_id: MatchId,
        winner: TeamId,
    ) -> Result<Match, DraftError> {
        let record = self.match_record(match_id)?;
        update(&record, |m| logic::record_game_winner(m, winner, Utc::now()))
    }

    // --- draft sessions ---

    /// Create a draft session.
    ///
    /// A session linked to a match is created through [`DraftStore::start_game_draft`], so it
    /// is registered for its game, gets its names from the match and its fearless bans from
    /// earlier games. A standalone session has no earlier games and no fearless bans.
    pub fn create_draft_session(&self, init: NewDraftSession) -> Result<DraftSession, DraftError> {
        if let Some(match_id) = init.match_id {
            return self.start_game_draft(match_id, init.game_number);
        }
        let session = DraftSession::new(NewDraftSession {
            fearless_banned_champions: BTreeSet::new(),
            ..init
        });
        self.insert_draft(session.clone());
        log::info!("created draft session {}", session.id);
        Ok(session)
    }

    fn insert_draft(&self, session: DraftSession) {
        write(&self.drafts).insert(session.id, Arc::new(Mutex::new(session)));
    }

    fn draft_record(&self, id: DraftId) -> Result<Shared<DraftSession>, DraftError> {
        read(&self.drafts)
            .get(&id)
            .cloned()
            .ok_or(DraftError::not_found("draft session", id))
    }

    pub fn get_draft(&self, id: DraftId) -> Result<DraftSession, DraftError> {
        let record = self.draft_record(id)?;
        let session = lock(&record).clone();
        Ok(session)
    }

    pub fn start_draft(&self, id: DraftId) -> Result<DraftSession, DraftError> {
        let record = self.draft_record(id)?;
        update(&record, logic::start_draft)
    }

    /// Ban for whichever side is up.
    pub fn ban_champion(
        &self,
        id: DraftId,
        champion: Option<&str>,
    ) -> Result<DraftSession, DraftError> {
        self.ban_champion_as(id, &Subject::Moderator, champion)
    }

    /// Pick for whichever side is up.
    pub fn pick_champion(
        &self,
        id: DraftId,
        champion: Option<&str>,
    ) -> Result<DraftSession, DraftError> {
        self.pick_champion_as(id, &Subject::Moderator, champion)
    }

    /// Ban on behalf of `subject`, failing with `OutOfTurn` unless it may act for the side
    /// that is up. The check runs under the session lock.
    pub fn ban_champion_as(
        &self,
        id: DraftId,
        subject: &Subject,
        champion: Option<&str>,
    ) -> Result<DraftSession, DraftError> {
        let record = self.draft_record(id)?;
        update(&record, |s| {
            check_turn(s, subject)?;
            logic::ban_champion(s, champion)
        })
    }

    /// Pick on behalf of `subject`; see [`DraftStore::ban_champion_as`].
    pub fn pick_champion_as(
        &self,
        id: DraftId,
        subject: &Subject,
        champion: Option<&str>,
    ) -> Result<DraftSession, DraftError> {
        let record = self.draft_record(id)?;
        update(&record, |s| {
            check_turn(s, subject)?;
            logic::pick_champion(s, champion)
        })
    }

    /// Draft sessions linked to a match, by game number.
    pub fn sessions_for_match(&self, match_id: MatchId) -> Vec<DraftSession> {
        let records: Vec<_> = read(&self.drafts).values().cloned().collect();
        let mut sessions: Vec<DraftSession> = records
            .iter()
            .map(|r| lock(r).clone())
            .filter(|s| s.match_id == Some(match_id))
            .collect();
        sessions.sort_by_key(|s| s.game_number);
        sessions
    }

    /// Draft session for game `game_number` (default: the match's current game).
    ///
    /// Returns the existing session if one was already created for that game. Otherwise
    /// creates one carrying the fearless bans from earlier completed games. Runs under the
    /// match lock, so concurrent calls for the same game create one session.
    pub fn start_game_draft(
        &self,
        match_id: MatchId,
        game_number: Option<u32>,
    ) -> Result<DraftSession, DraftError> {
        let record = self.match_record(match_id)?;
        let mut m = lock(&record);
        let game = game_number.unwrap_or(m.current_game);

        let existing = read(&self.games).get(&(match_id, game)).copied();
        if let Some(draft_id) = existing {
            log::debug!("match {} game {} already has draft {}", match_id, game, draft_id);
            return self.get_draft(draft_id);
        }

        let max = m.series_format.max_games();
        if game == 0 || game > max {
            return Err(DraftError::InvalidGameNumber { game, max });
        }
        if m.is_completed() {
            return Err(DraftError::InvalidTransition {
                action: "start a game draft",
                phase: "completed".to_string(),
            });
        }

        let prior = self.sessions_for_match(match_id);
        let fearless_banned_champions = logic::fearless_bans(&m, game, &prior);
        let tournament_name = self.get_tournament(m.tournament_id).ok().map(|t| t.name);
        let session = DraftSession::new(NewDraftSession {
            tournament_id: Some(m.tournament_id),
            match_id: Some(match_id),
            game_number: Some(game),
            tournament_name,
            blue_team_name: Some(m.team1_name.clone()),
            red_team_name: Some(m.team2_name.clone()),
            fearless_banned_champions,
        });
        self.insert_draft(session.clone());
        write(&self.games).insert((match_id, game), session.id);
        if m.status == MatchStatus::Pending {
            m.status = MatchStatus::InProgress;
        }
        log::info!(
            "match {} game {}: draft {} created ({} fearless bans)",
            match_id,
            game,
            session.id,
            session.fearless_banned_champions.len()
        );
        Ok(session)
    }
}
