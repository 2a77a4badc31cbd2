//! Access codes and bearer tokens for moderators and team captains.
//!
//! A moderator hands each captain a short one-time code. Redeeming it yields a bearer
//! token bound to one side of one draft.

use crate::models::{DraftId, Side};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

/// Characters used in access codes: uppercase letters and digits without 0/O/1/I.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 8;
const TOKEN_LEN: usize = 40;

/// Who a token speaks for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Subject {
    Moderator,
    #[serde(rename_all = "camelCase")]
    Captain { draft_id: DraftId, side: Side },
}

impl Subject {
    /// May this subject act for `side` in draft `draft_id`?
    pub fn may_act(&self, draft_id: DraftId, side: Side) -> bool {
        match *self {
            Subject::Moderator => true,
            Subject::Captain { draft_id: d, side: s } => d == draft_id && s == side,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("unknown or expired access code")]
    InvalidCode,
    #[error("wrong password")]
    WrongPassword,
}

/// Issues and checks opaque bearer tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, subject: Subject) -> String;
    /// Subject of a live token. Expired and revoked tokens yield `None`.
    fn validate(&self, token: &str) -> Option<Subject>;
    fn revoke(&self, token: &str);
    /// Forget tokens that expired before `now`. Returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// Something handed out with a deadline: a token or an access code.
struct Issued {
    subject: Subject,
    expires_at: DateTime<Utc>,
}

impl Issued {
    fn live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Random tokens kept in a map, each valid for a fixed time after issue; lost on restart.
pub struct MemoryTokens {
    tokens: RwLock<HashMap<String, Issued>>,
    ttl: Duration,
}

impl MemoryTokens {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn issue_at(&self, subject: Subject, now: DateTime<Utc>) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens.write().unwrap_or_else(PoisonError::into_inner).insert(
            token.clone(),
            Issued {
                subject,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Subject> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|t| t.live_at(now))
            .map(|t| t.subject)
    }
}

impl TokenIssuer for MemoryTokens {
    fn issue(&self, subject: Subject) -> String {
        self.issue_at(subject, Utc::now())
    }

    fn validate(&self, token: &str) -> Option<Subject> {
        self.validate_at(token, Utc::now())
    }

    fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let before = tokens.len();
        tokens.retain(|_, t| t.live_at(now));
        before - tokens.len()
    }
}

/// One-time access codes, each valid for a fixed time after issue.
pub struct AccessCodes {
    codes: Mutex<HashMap<String, Issued>>,
    ttl: Duration,
}

impl AccessCodes {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn issue(&self, subject: Subject) -> String {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: Subject, now: DateTime<Utc>) -> String {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rng = rand::thread_rng();
        let code = loop {
            let candidate: String = (0..CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !codes.contains_key(&candidate) {
                break candidate;
            }
        };
        codes.insert(
            code.clone(),
            Issued {
                subject,
                expires_at: now + self.ttl,
            },
        );
        code
    }

    /// Consume the code and issue a token for its subject. Codes are case-insensitive.
    pub fn redeem(&self, code: &str, tokens: &dyn TokenIssuer) -> Result<String, AuthError> {
        self.redeem_at(code, tokens, Utc::now())
    }

    pub fn redeem_at(
        &self,
        code: &str,
        tokens: &dyn TokenIssuer,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let key = code.trim().to_ascii_uppercase();
        let issued = self
            .codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .ok_or(AuthError::InvalidCode)?;
        if !issued.live_at(now) {
            return Err(AuthError::InvalidCode);
        }
        Ok(tokens.issue(issued.subject))
    }

    /// Drop codes that expired before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        let before = codes.len();
        codes.retain(|_, c| c.live_at(now));
        before - codes.len()
    }
}

/// Moderator login check.
pub fn check_password(expected: &str, given: &str) -> Result<(), AuthError> {
    if !expected.is_empty() && expected == given {
        Ok(())
    } else {
        Err(AuthError::WrongPassword)
    }
}
