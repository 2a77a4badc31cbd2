//! Single binary web server for champion select drafts and tournament series.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Moderator password: ADMIN_PASSWORD. Cookie secret: SESSION_KEY (64+ bytes).
//! Lifetimes in minutes: CODE_TTL_MINUTES (access codes), TOKEN_TTL_MINUTES (captain tokens).

use actix_web::{cookie::Key, middleware::Logger, web::Data, App, HttpServer};
use champ_select_web::api::{self, AppState};
use champ_select_web::Config;
use chrono::Utc;
use std::time::Duration;

/// How often expired access codes and tokens are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let key = match &config.session_key {
        Some(bytes) => Key::from(bytes.as_slice()),
        None => Key::generate(),
    };
    let state = Data::new(AppState::new(&config));

    // Background task: drop access codes nobody redeemed in time and tokens past their ttl
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let now = Utc::now();
            let codes = state_cleanup.codes.purge_expired(now);
            let tokens = state_cleanup.tokens.purge_expired(now);
            if codes + tokens > 0 {
                log::info!("Removed {} expired access code(s), {} token(s)", codes, tokens);
            }
        }
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(api::session_middleware(key.clone()))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
