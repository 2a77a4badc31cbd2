//! Server settings read from the environment.

use chrono::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_CODE_TTL_MINUTES: i64 = 120;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 12 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub admin_password: String,
    /// Secret for the moderator cookie session. `None` means generate one per run.
    pub session_key: Option<Vec<u8>>,
    pub code_ttl: Duration,
    /// How long a captain's bearer token stays valid after the code is redeemed.
    pub token_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            session_key: None,
            code_ttl: Duration::minutes(DEFAULT_CODE_TTL_MINUTES),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }
}

impl Config {
    /// Read HOST, PORT, ADMIN_PASSWORD, SESSION_KEY, CODE_TTL_MINUTES and TOKEN_TTL_MINUTES.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = get("HOST").unwrap_or(defaults.host);
        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Invalid PORT {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let admin_password = get("ADMIN_PASSWORD").unwrap_or_else(|| {
            log::warn!("ADMIN_PASSWORD not set, using the default password");
            defaults.admin_password
        });
        // Cookie signing needs at least 64 bytes of key material.
        let session_key = get("SESSION_KEY")
            .map(String::into_bytes)
            .filter(|k| {
                let ok = k.len() >= 64;
                if !ok {
                    log::warn!("SESSION_KEY shorter than 64 bytes, generating one instead");
                }
                ok
            });
        let code_ttl = minutes(&get, "CODE_TTL_MINUTES").unwrap_or(defaults.code_ttl);
        let token_ttl = minutes(&get, "TOKEN_TTL_MINUTES").unwrap_or(defaults.token_ttl);

        Self {
            host,
            port,
            admin_password,
            session_key,
            code_ttl,
            token_ttl,
        }
    }
}

/// Positive whole minutes, or `None` when unset or unparsable.
fn minutes(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = get(key)?;
    match raw.parse::<i64>() {
        Ok(m) if m > 0 => Some(Duration::minutes(m)),
        _ => {
            log::warn!("Invalid {} {:?}, using the default", key, raw);
            None
        }
    }
}
