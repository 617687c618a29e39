use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

/// OAuth `state` lifetime
pub const STATE_TTL_SECS: i64 = 600;
const STATE_PURPOSE: &str = "oauth_state";

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    nonce: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 tokens
///
/// Besides access tokens this signs the OAuth `state` parameter, so the
/// callback can be checked without server-side session storage.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_ttl: Duration::seconds(token_ttl_secs),
        }
    }

    /// Sign an access token for a user
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        self.sign(&claims)
    }

    /// Verify an access token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Sign a fresh OAuth `state` value
    ///
    /// Returns the state token and its nonce. The nonce also goes into a
    /// browser cookie so the callback can tie the state to that browser.
    pub fn issue_state(&self) -> Result<(String, String), AuthError> {
        let now = Utc::now();
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();

        let token = self.sign(&StateClaims {
            nonce: nonce.clone(),
            purpose: STATE_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + STATE_TTL_SECS,
        })?;

        Ok((token, nonce))
    }

    /// Check an OAuth `state` value returned by the provider; returns its nonce
    pub fn verify_state(&self, state: &str) -> Result<String, AuthError> {
        let claims = decode::<StateClaims>(state, &self.decoding, &self.validation)
            .map_err(map_decode_error)?
            .claims;

        if claims.purpose != STATE_PURPOSE {
            return Err(AuthError::InvalidToken("unexpected token purpose".to_string()));
        }
        Ok(claims.nonce)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtManager::new("secret", 3600);
        let user_id = Uuid::new_v4();

        let token = jwt.issue(user_id, "a@example.com").unwrap();
        let claims = jwt.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("one", 3600).issue(Uuid::new_v4(), "a@b.c").unwrap();
        let err = JwtManager::new("two", 3600).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_expired_token() {
        let jwt = JwtManager::new("secret", -3600);
        let token = jwt.issue(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(matches!(jwt.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_state_round_trip() {
        let jwt = JwtManager::new("secret", 3600);
        let (state, nonce) = jwt.issue_state().unwrap();
        assert_eq!(jwt.verify_state(&state).unwrap(), nonce);
        assert_eq!(nonce.len(), 24);
        assert!(jwt.verify_state("garbage").is_err());
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let jwt = JwtManager::new("secret", 3600);
        let access = jwt.issue(Uuid::new_v4(), "a@b.c").unwrap();
        let (state, _) = jwt.issue_state().unwrap();

        assert!(jwt.verify_state(&access).is_err());
        assert!(jwt.verify(&state).is_err());
    }
}
