//! Token authentication.
//!
//! Regular callers present `hex(SHA-512(account + login + salt))`. The admin
//! login presents `hex(SHA-512(YYYYMMDDHH + admin_salt))` computed from local
//! time, so an admin token is only good for the hour it was minted in.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::clock::Clock;
use crate::request::MethodRequest;

/// Default salt for regular callers.
pub const DEFAULT_SALT: &str = "Otus";

/// Default admin login.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";

/// Default salt for the admin token.
pub const DEFAULT_ADMIN_SALT: &str = "42";

const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Secrets used to derive expected tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Salt appended to `account + login`.
    pub salt: String,
    /// Login that takes the admin path.
    pub admin_login: String,
    /// Salt appended to the hour stamp on the admin path.
    pub admin_salt: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_string(),
            admin_login: DEFAULT_ADMIN_LOGIN.to_string(),
            admin_salt: DEFAULT_ADMIN_SALT.to_string(),
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("salt", &"[REDACTED]")
            .field("admin_login", &self.admin_login)
            .field("admin_salt", &"[REDACTED]")
            .finish()
    }
}

fn sha512_hex(parts: &[&str]) -> String {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Checks envelope tokens.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    settings: AuthSettings,
    clock: Arc<dyn Clock>,
}

impl AuthGuard {
    /// Creates a guard reading "now" from `clock`.
    #[must_use]
    pub fn new(settings: AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Returns `true` if `request` is on the admin path.
    #[must_use]
    pub fn is_admin(&self, request: &MethodRequest) -> bool {
        request.is_admin_for(&self.settings.admin_login)
    }

    /// Digest for a regular caller. Missing parts hash as empty strings.
    #[must_use]
    pub fn user_digest(&self, account: Option<&str>, login: Option<&str>) -> String {
        sha512_hex(&[
            account.unwrap_or_default(),
            login.unwrap_or_default(),
            self.settings.salt.as_str(),
        ])
    }

    /// Admin digest for the hour containing `at`.
    #[must_use]
    pub fn admin_digest_at(&self, at: NaiveDateTime) -> String {
        let hour = at.format(ADMIN_HOUR_FORMAT).to_string();
        sha512_hex(&[hour.as_str(), self.settings.admin_salt.as_str()])
    }

    /// The digest `request` must carry right now.
    #[must_use]
    pub fn expected_digest(&self, request: &MethodRequest) -> String {
        if self.is_admin(request) {
            self.admin_digest_at(self.clock.now())
        } else {
            self.user_digest(request.account(), request.login())
        }
    }

    /// Returns `true` if the request token matches the expected digest.
    ///
    /// The comparison runs in constant time over the token bytes.
    #[must_use]
    pub fn check(&self, request: &MethodRequest) -> bool {
        let Some(token) = request.token() else {
            return false;
        };
        let expected = self.expected_digest(request);
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }
}
