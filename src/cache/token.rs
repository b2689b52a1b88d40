use chrono::{DateTime, TimeDelta, Utc};

/// Lifetime assumed when the identity provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECONDS: u64 = 900;

/// A cached bearer token and the instant it stops being accepted.
#[derive(Clone)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// Token issued at `issued_at` that lives for `expires_in` seconds
    /// (`DEFAULT_EXPIRES_IN_SECONDS` when absent).
    pub fn issued(value: String, issued_at: DateTime<Utc>, expires_in: Option<u64>) -> Self {
        let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);
        let lifetime = seconds(expires_in);
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { value, expires_at }
    }

    /// Usable iff `now < expires_at - safety_margin`.
    pub fn is_valid(&self, now: DateTime<Utc>, safety_margin: TimeDelta) -> bool {
        match self.expires_at.checked_sub_signed(safety_margin) {
            Some(deadline) => now < deadline,
            None => false,
        }
    }
}

/// `TimeDelta` of `secs` seconds, saturating instead of overflowing.
pub fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &crate::helpers::secret::mask(&self.value))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
