//! JSON API: tournaments, matches, draft sessions and captain access codes.
//!
//! Moderators log in with a password and are tracked by a cookie session. Captains redeem
//! an access code for a bearer token that lets them act for one side of one draft.

use crate::auth::{check_password, AccessCodes, MemoryTokens, Subject, TokenIssuer};
use crate::config::Config;
use crate::models::{
    DraftError, DraftId, Match, MatchId, NewDraftSession, SeriesFormat, Side, TeamEntry, TeamId,
    Tournament, TournamentId,
};
use crate::store::DraftStore;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    get,
    http::header,
    post,
    web::{self, Data, Json, Path},
    HttpRequest, HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};

const MODERATOR_KEY: &str = "moderator";

/// Shared server state.
pub struct AppState {
    pub store: DraftStore,
    pub tokens: Box<dyn TokenIssuer>,
    pub codes: AccessCodes,
    admin_password: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: DraftStore::new(),
            tokens: Box::new(MemoryTokens::new(config.token_ttl)),
            codes: AccessCodes::new(config.code_ttl),
            admin_password: config.admin_password.clone(),
        }
    }
}

type State = Data<AppState>;

/// Cookie session used for moderator logins. Served over plain HTTP, so not `Secure`.
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(false)
        .build()
}

/// Register every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_admin_login)
        .service(api_admin_logout)
        .service(api_redeem_code)
        .service(api_revoke_token)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_add_team)
        .service(api_create_match)
        .service(api_get_match)
        .service(api_match_drafts)
        .service(api_record_winner)
        .service(api_start_game_draft)
        .service(api_create_draft)
        .service(api_get_draft)
        .service(api_issue_code)
        .service(api_start_draft)
        .service(api_ban)
        .service(api_pick);
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

#[derive(Deserialize)]
struct RedeemBody {
    code: String,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
}

#[derive(Deserialize)]
struct AddTeamBody {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMatchBody {
    team1_id: TeamId,
    team2_id: TeamId,
    #[serde(default = "default_round")]
    round: u32,
    #[serde(default)]
    series_format: SeriesFormat,
    #[serde(default)]
    fearless_mode: bool,
}

fn default_round() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WinnerBody {
    winner_id: TeamId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameDraftBody {
    #[serde(default)]
    game_number: Option<u32>,
}

/// `{"championId": null}` or a missing body means the side let its timer run out.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChampionBody {
    #[serde(default)]
    champion_id: Option<String>,
}

#[derive(Deserialize)]
struct IssueCodeBody {
    side: Side,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuedCodeResponse {
    code: String,
    draft_id: DraftId,
    side: Side,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
    subject: Subject,
}

#[derive(Serialize)]
struct TournamentView {
    #[serde(flatten)]
    tournament: Tournament,
    teams: Vec<TeamEntry>,
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
struct DraftPath {
    id: DraftId,
}

fn error_json(message: impl ToString) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn draft_error(e: &DraftError) -> HttpResponse {
    let body = error_json(e);
    match e {
        DraftError::NotFound { .. } => HttpResponse::NotFound().json(body),
        DraftError::InvalidTransition { .. }
        | DraftError::ChampionUnavailable(_)
        | DraftError::InvalidGameNumber { .. } => HttpResponse::Conflict().json(body),
        DraftError::FearlessBanned(_) => HttpResponse::UnprocessableEntity().json(body),
        DraftError::OutOfTurn(_) => HttpResponse::Forbidden().json(body),
        DraftError::InvalidWinner(_) | DraftError::SelfMatch(_) => {
            HttpResponse::BadRequest().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, DraftError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => draft_error(&e),
    }
}

fn is_moderator(session: &Session) -> bool {
    matches!(session.get::<bool>(MODERATOR_KEY), Ok(Some(true)))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn caller(req: &HttpRequest, session: &Session, state: &AppState) -> Option<Subject> {
    if is_moderator(session) {
        return Some(Subject::Moderator);
    }
    bearer_token(req).and_then(|t| state.tokens.validate(t))
}

fn require_moderator(
    req: &HttpRequest,
    session: &Session,
    state: &AppState,
) -> Result<(), HttpResponse> {
    match caller(req, session, state) {
        Some(Subject::Moderator) => Ok(()),
        Some(_) => Err(HttpResponse::Forbidden().json(error_json("Moderator only"))),
        None => Err(HttpResponse::Unauthorized().json(error_json("Login required"))),
    }
}

/// Moderator or captain. Whether a captain may act for the side that is up is checked
/// by the store, under the draft's lock.
fn require_caller(
    req: &HttpRequest,
    session: &Session,
    state: &AppState,
) -> Result<Subject, HttpResponse> {
    caller(req, session, state)
        .ok_or_else(|| HttpResponse::Unauthorized().json(error_json("Access code required")))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "champ-select-web",
    })
}

#[post("/api/admin/login")]
async fn api_admin_login(state: State, session: Session, body: Json<LoginBody>) -> HttpResponse {
    if let Err(e) = check_password(&state.admin_password, &body.password) {
        log::warn!("Failed moderator login");
        return HttpResponse::Unauthorized().json(error_json(e));
    }
    session.renew();
    match session.insert(MODERATOR_KEY, true) {
        Ok(()) => {
            log::info!("Moderator logged in");
            HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
        }
        Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
    }
}

#[post("/api/admin/logout")]
async fn api_admin_logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Exchange a one-time access code for a bearer token.
#[post("/api/auth/redeem")]
async fn api_redeem_code(state: State, body: Json<RedeemBody>) -> HttpResponse {
    match state.codes.redeem(&body.code, state.tokens.as_ref()) {
        Ok(token) => match state.tokens.validate(&token) {
            Some(subject) => HttpResponse::Ok().json(TokenResponse { token, subject }),
            None => HttpResponse::InternalServerError().json(error_json("token lost")),
        },
        Err(e) => HttpResponse::Unauthorized().json(error_json(e)),
    }
}

#[post("/api/auth/revoke")]
async fn api_revoke_token(state: State, req: HttpRequest) -> HttpResponse {
    if let Some(token) = bearer_token(&req) {
        state.tokens.revoke(token);
    }
    HttpResponse::NoContent().finish()
}

#[post("/api/tournaments")]
async fn api_create_tournament(
    state: State,
    req: HttpRequest,
    session: Session,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Name required"));
    }
    HttpResponse::Ok().json(state.store.create_tournament(name))
}

/// Tournament with its teams and matches.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    match state.store.get_tournament(path.id) {
        Ok(tournament) => HttpResponse::Ok().json(TournamentView {
            teams: state.store.list_teams(tournament.id),
            matches: state.store.list_matches(tournament.id),
            tournament,
        }),
        Err(e) => draft_error(&e),
    }
}

#[post("/api/tournaments/{id}/teams")]
async fn api_add_team(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<AddTeamBody>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Name required"));
    }
    respond(state.store.add_team(path.id, name))
}

#[post("/api/tournaments/{id}/matches")]
async fn api_create_match(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<CreateMatchBody>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    respond(state.store.create_match(
        path.id,
        body.team1_id,
        body.team2_id,
        body.round,
        body.series_format,
        body.fearless_mode,
    ))
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: State, path: Path<MatchPath>) -> HttpResponse {
    respond(state.store.get_match(path.id))
}

/// Draft sessions of every game played (or started) in the match.
#[get("/api/matches/{id}/drafts")]
async fn api_match_drafts(state: State, path: Path<MatchPath>) -> HttpResponse {
    match state.store.get_match(path.id) {
        Ok(_) => HttpResponse::Ok().json(state.store.sessions_for_match(path.id)),
        Err(e) => draft_error(&e),
    }
}

#[post("/api/matches/{id}/winner")]
async fn api_record_winner(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<MatchPath>,
    body: Json<WinnerBody>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    respond(state.store.record_game_winner(path.id, body.winner_id))
}

/// Draft for a game of the series; returns the existing one if already created.
#[post("/api/matches/{id}/games")]
async fn api_start_game_draft(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<MatchPath>,
    body: Option<Json<GameDraftBody>>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    let game = body.and_then(|b| b.game_number);
    respond(state.store.start_game_draft(path.id, game))
}

/// Standalone draft, or the draft of a match game when the body names a `matchId`.
#[post("/api/drafts")]
async fn api_create_draft(
    state: State,
    req: HttpRequest,
    session: Session,
    body: Option<Json<NewDraftSession>>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    let init = body.map(Json::into_inner).unwrap_or_default();
    respond(state.store.create_draft_session(init))
}

#[get("/api/drafts/{id}")]
async fn api_get_draft(state: State, path: Path<DraftPath>) -> HttpResponse {
    respond(state.store.get_draft(path.id))
}

/// Issue a one-time code for the captain of one side.
#[post("/api/drafts/{id}/codes")]
async fn api_issue_code(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<DraftPath>,
    body: Json<IssueCodeBody>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    if let Err(e) = state.store.get_draft(path.id) {
        return draft_error(&e);
    }
    let code = state.codes.issue(Subject::Captain {
        draft_id: path.id,
        side: body.side,
    });
    HttpResponse::Ok().json(IssuedCodeResponse {
        code,
        draft_id: path.id,
        side: body.side,
    })
}

#[post("/api/drafts/{id}/start")]
async fn api_start_draft(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<DraftPath>,
) -> HttpResponse {
    if let Err(resp) = require_moderator(&req, &session, &state) {
        return resp;
    }
    respond(state.store.start_draft(path.id))
}

#[post("/api/drafts/{id}/ban")]
async fn api_ban(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<DraftPath>,
    body: Option<Json<ChampionBody>>,
) -> HttpResponse {
    let subject = match require_caller(&req, &session, &state) {
        Ok(subject) => subject,
        Err(resp) => return resp,
    };
    let champion = body.as_ref().and_then(|b| b.champion_id.as_deref());
    respond(state.store.ban_champion_as(path.id, &subject, champion))
}

#[post("/api/drafts/{id}/pick")]
async fn api_pick(
    state: State,
    req: HttpRequest,
    session: Session,
    path: Path<DraftPath>,
    body: Option<Json<ChampionBody>>,
) -> HttpResponse {
    let subject = match require_caller(&req, &session, &state) {
        Ok(subject) => subject,
        Err(resp) => return resp,
    };
    let champion = body.as_ref().and_then(|b| b.champion_id.as_deref());
    respond(state.store.pick_champion_as(path.id, &subject, champion))
}
