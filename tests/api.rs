//! HTTP API tests: moderator login, captain access codes, turn enforcement, error mapping.

use actix_web::{cookie::Key, http::StatusCode, test, web::Data, App};
use champ_select_web::api::{self, AppState};
use champ_select_web::Config;
use serde_json::{json, Value};

fn state() -> Data<AppState> {
    let config = Config {
        admin_password: "secret".to_string(),
        ..Config::default()
    };
    Data::new(AppState::new(&config))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(api::session_middleware(Key::generate()))
                .app_data($state.clone())
                .configure(api::configure),
        )
        .await
    };
}

/// Log in as moderator and return the session cookie.
macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "password": "secret" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned()
    }};
}

#[actix_web::test]
async fn health_is_public() {
    let state = state();
    let app = app!(state);
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ok"], true);
}

#[actix_web::test]
async fn wrong_password_and_anonymous_writes_are_rejected() {
    let state = state();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/api/admin/login")
        .set_json(json!({ "password": "nope" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/tournaments")
        .set_json(json!({ "name": "Cup" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post().uri("/api/drafts").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unknown_draft_is_404() {
    let state = state();
    let app = app!(state);
    let req = test::TestRequest::get()
        .uri(&format!("/api/drafts/{}", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn series_flow_with_captain_codes() {
    let state = state();
    let app = app!(state);
    let cookie = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/tournaments")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Spring Split" }))
        .to_request();
    let tournament: Value = test::call_and_read_body_json(&app, req).await;
    let tid = tournament["id"].as_str().unwrap().to_string();

    let mut team_ids = Vec::new();
    for name in ["Blue Wolves", "Red Ravens"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/tournaments/{tid}/teams"))
            .cookie(cookie.clone())
            .set_json(json!({ "name": name }))
            .to_request();
        let team: Value = test::call_and_read_body_json(&app, req).await;
        team_ids.push(team["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/tournaments/{tid}/matches"))
        .cookie(cookie.clone())
        .set_json(json!({
            "team1Id": team_ids[0],
            "team2Id": team_ids[1],
            "seriesFormat": "bo3",
            "fearlessMode": true
        }))
        .to_request();
    let series: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(series["currentGame"], 1);
    assert_eq!(series["status"], "pending");
    let mid = series["id"].as_str().unwrap().to_string();

    // Starting the game draft twice yields the same session.
    let mut draft_ids = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/matches/{mid}/games"))
            .cookie(cookie.clone())
            .to_request();
        let draft: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(draft["phase"], "waiting");
        assert_eq!(draft["timer"], "30");
        draft_ids.push(draft["id"].as_str().unwrap().to_string());
    }
    assert_eq!(draft_ids[0], draft_ids[1]);
    let did = draft_ids[0].clone();

    let mut tokens = Vec::new();
    for side in ["blue", "red"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/drafts/{did}/codes"))
            .cookie(cookie.clone())
            .set_json(json!({ "side": side }))
            .to_request();
        let issued: Value = test::call_and_read_body_json(&app, req).await;
        let code = issued["code"].as_str().unwrap().to_lowercase();

        let req = test::TestRequest::post()
            .uri("/api/auth/redeem")
            .set_json(json!({ "code": code }))
            .to_request();
        let redeemed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(redeemed["subject"]["side"], side);
        tokens.push(redeemed["token"].as_str().unwrap().to_string());

        // One-time: a second redeem fails.
        let req = test::TestRequest::post()
            .uri("/api/auth/redeem")
            .set_json(json!({ "code": code }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
    let (blue, red) = (&tokens[0], &tokens[1]);

    // Captains cannot start the draft.
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/start"))
        .insert_header(("Authorization", format!("Bearer {blue}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/start"))
        .cookie(cookie.clone())
        .to_request();
    let draft: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(draft["phase"], "ban1");
    assert_eq!(draft["currentTeam"], "blue");

    // Red may not ban on blue's turn.
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/ban"))
        .insert_header(("Authorization", format!("Bearer {red}")))
        .set_json(json!({ "championId": "Ahri" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/ban"))
        .insert_header(("Authorization", format!("Bearer {blue}")))
        .set_json(json!({ "championId": "Ahri" }))
        .to_request();
    let draft: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(draft["blueTeamBans"], json!(["Ahri"]));
    assert_eq!(draft["currentTeam"], "red");
    assert_eq!(draft["phaseStep"], 1);

    // Timed out: null champion records the sentinel.
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/ban"))
        .insert_header(("Authorization", format!("Bearer {red}")))
        .set_json(json!({ "championId": null }))
        .to_request();
    let draft: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(draft["redTeamBans"], json!(["EMPTY_BAN"]));

    // Banning the same champion again conflicts.
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/ban"))
        .cookie(cookie.clone())
        .set_json(json!({ "championId": "Ahri" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    // Picking during a ban phase conflicts too.
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/pick"))
        .insert_header(("Authorization", format!("Bearer {blue}")))
        .set_json(json!({ "championId": "Zed" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{mid}/winner"))
        .cookie(cookie.clone())
        .set_json(json!({ "winnerId": team_ids[0] }))
        .to_request();
    let series: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(series["team1Wins"], 1);
    assert_eq!(series["currentGame"], 2);
    assert_eq!(series["status"], "in_progress");

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{mid}/winner"))
        .cookie(cookie.clone())
        .set_json(json!({ "winnerId": uuid::Uuid::new_v4() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tournaments/{tid}"))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["name"], "Spring Split");
    assert_eq!(view["teams"].as_array().unwrap().len(), 2);
    assert_eq!(view["matches"][0]["team1Wins"], 1);
}

#[actix_web::test]
async fn token_for_another_draft_is_forbidden_and_revoked_token_is_unauthorized() {
    let state = state();
    let app = app!(state);
    let cookie = login!(app);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/drafts")
            .cookie(cookie.clone())
            .to_request();
        let draft: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(draft["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{}/codes", ids[0]))
        .cookie(cookie.clone())
        .set_json(json!({ "side": "blue" }))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/redeem")
        .set_json(json!({ "code": issued["code"] }))
        .to_request();
    let redeemed: Value = test::call_and_read_body_json(&app, req).await;
    let token = redeemed["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{}/ban", ids[1]))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/auth/revoke")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{}/ban", ids[0]))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

/// POST with the moderator cookie and an optional JSON body; asserts 200 and returns the body.
macro_rules! post_ok {
    ($app:expr, $cookie:expr, $uri:expr) => {
        post_ok!($app, $cookie, $uri, json!({}))
    };
    ($app:expr, $cookie:expr, $uri:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri(&$uri)
            .cookie($cookie.clone())
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "POST {}", $uri);
        test::read_body_json::<Value, _>(resp).await
    }};
}

#[actix_web::test]
async fn fearless_banned_pick_is_unprocessable() {
    let state = state();
    let app = app!(state);
    let cookie = login!(app);

    let tournament = post_ok!(
        app,
        cookie,
        "/api/tournaments".to_string(),
        json!({ "name": "Cup" })
    );
    let tid = tournament["id"].as_str().unwrap().to_string();
    let mut team_ids = Vec::new();
    for name in ["Blue Wolves", "Red Ravens"] {
        let team = post_ok!(
            app,
            cookie,
            format!("/api/tournaments/{tid}/teams"),
            json!({ "name": name })
        );
        team_ids.push(team["id"].as_str().unwrap().to_string());
    }
    let series = post_ok!(
        app,
        cookie,
        format!("/api/tournaments/{tid}/matches"),
        json!({
            "team1Id": team_ids[0],
            "team2Id": team_ids[1],
            "seriesFormat": "bo3",
            "fearlessMode": true
        })
    );
    let mid = series["id"].as_str().unwrap().to_string();

    // Game 1, created through the generic endpoint: 6 timed-out bans, then 10 picks.
    let game1 = post_ok!(
        app,
        cookie,
        "/api/drafts".to_string(),
        json!({ "matchId": mid, "gameNumber": 1 })
    );
    let g1 = game1["id"].as_str().unwrap().to_string();
    post_ok!(app, cookie, format!("/api/drafts/{g1}/start"));
    for _ in 0..6 {
        post_ok!(app, cookie, format!("/api/drafts/{g1}/ban"));
    }
    let picks = [
        "Ahri", "Zed", "Lux", "Jinx", "Thresh", "Garen", "Vi", "Orianna", "Ezreal", "Nami",
    ];
    for champion in picks {
        post_ok!(
            app,
            cookie,
            format!("/api/drafts/{g1}/pick"),
            json!({ "championId": champion })
        );
    }
    post_ok!(
        app,
        cookie,
        format!("/api/matches/{mid}/winner"),
        json!({ "winnerId": team_ids[0] })
    );

    // A request body cannot seed or clear the fearless set.
    let game2 = post_ok!(
        app,
        cookie,
        "/api/drafts".to_string(),
        json!({ "matchId": mid, "gameNumber": 2, "fearlessBannedChampions": [] })
    );
    let g2 = game2["id"].as_str().unwrap().to_string();
    assert_eq!(game2["fearlessBannedChampions"].as_array().unwrap().len(), 10);
    let again = post_ok!(app, cookie, format!("/api/matches/{mid}/games"));
    assert_eq!(again["id"], game2["id"]);

    post_ok!(app, cookie, format!("/api/drafts/{g2}/start"));
    for _ in 0..6 {
        post_ok!(app, cookie, format!("/api/drafts/{g2}/ban"));
    }
    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{g2}/pick"))
        .cookie(cookie.clone())
        .set_json(json!({ "championId": "Ahri" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Ahri"));

    let standalone = post_ok!(
        app,
        cookie,
        "/api/drafts".to_string(),
        json!({ "fearlessBannedChampions": ["Ahri"] })
    );
    assert!(standalone["fearlessBannedChampions"].as_array().unwrap().is_empty());
    assert!(standalone["matchId"].is_null());
}

#[actix_web::test]
async fn draft_for_unknown_match_is_404() {
    let state = state();
    let app = app!(state);
    let cookie = login!(app);
    let req = test::TestRequest::post()
        .uri("/api/drafts")
        .cookie(cookie.clone())
        .set_json(json!({ "matchId": uuid::Uuid::new_v4() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn captain_token_past_its_ttl_is_unauthorized() {
    let config = Config {
        admin_password: "secret".to_string(),
        token_ttl: chrono::Duration::zero(),
        ..Config::default()
    };
    let state = Data::new(AppState::new(&config));
    let app = app!(state);
    let cookie = login!(app);

    let draft = post_ok!(app, cookie, "/api/drafts".to_string());
    let did = draft["id"].as_str().unwrap().to_string();
    let issued = post_ok!(
        app,
        cookie,
        format!("/api/drafts/{did}/codes"),
        json!({ "side": "blue" })
    );
    let req = test::TestRequest::post()
        .uri("/api/auth/redeem")
        .set_json(json!({ "code": issued["code"] }))
        .to_request();
    let redeemed: Value = test::call_and_read_body_json(&app, req).await;
    let token = redeemed["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/drafts/{did}/ban"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.tokens.purge_expired(chrono::Utc::now()), 1);
}
