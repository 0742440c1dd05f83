use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

/// Bearer token and the instant it stops being accepted
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: String, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self { value, issued_at, expires_at }
    }

    /// Token issued at `issued_at` with the endpoint's `expires_in`.
    /// `None` when the expiry is not representable.
    pub fn issued(value: String, issued_at: DateTime<Utc>, expires_in_seconds: i64) -> Option<Self> {
        let lifetime = TimeDelta::try_seconds(expires_in_seconds)?;
        let expires_at = issued_at.checked_add_signed(lifetime)?;
        Some(Self::new(value, issued_at, expires_at))
    }

    /// Usable while `now` is before the expiry minus the safety margin.
    /// The margin never takes more than half of the token's lifetime.
    pub fn is_valid_at(&self, now: DateTime<Utc>, safety_margin: TimeDelta) -> bool {
        let half_life = (self.expires_at - self.issued_at) / 2;
        let margin = safety_margin.min(half_life).max(TimeDelta::zero());
        match now.checked_add_signed(margin) {
            Some(deadline) => deadline < self.expires_at,
            None => false,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validity_respects_safety_margin() {
        let now = Utc::now();
        let token = Token::issued("t".into(), now, 600).unwrap();
        assert!(token.is_valid_at(now, TimeDelta::seconds(30)));
        assert!(token.is_valid_at(now + TimeDelta::seconds(569), TimeDelta::seconds(30)));
        assert!(!token.is_valid_at(now + TimeDelta::seconds(570), TimeDelta::seconds(30)));
        assert!(!token.is_valid_at(now + TimeDelta::seconds(601), TimeDelta::zero()));
    }

    #[test]
    fn margin_is_capped_at_half_the_lifetime() {
        let now = Utc::now();
        let token = Token::issued("t".into(), now, 30).unwrap();
        assert!(token.is_valid_at(now, TimeDelta::seconds(30)));
        assert!(token.is_valid_at(now + TimeDelta::seconds(14), TimeDelta::seconds(30)));
        assert!(!token.is_valid_at(now + TimeDelta::seconds(15), TimeDelta::seconds(30)));
    }

    #[test]
    fn unrepresentable_expiry_is_rejected() {
        let now = Utc::now();
        assert!(Token::issued("t".into(), now, i64::MAX).is_none());
        assert!(Token::issued("t".into(), now, i64::MIN).is_none());
    }

    #[test]
    fn token_without_lifetime_is_never_valid() {
        let now = Utc::now();
        let token = Token::issued("t".into(), now, 0).unwrap();
        assert!(!token.is_valid_at(now, TimeDelta::zero()));
        let expired = Token::issued("t".into(), now, -5).unwrap();
        assert!(!expired.is_valid_at(now, TimeDelta::seconds(30)));
    }

    #[test]
    fn debug_output_hides_value() {
        let token = Token::issued("secret-value".into(), Utc::now(), 60).unwrap();
        assert!(!format!("{:?}", token).contains("secret-value"));
        assert_eq!(token.bearer(), "Bearer secret-value");
    }
}
