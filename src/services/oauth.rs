use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::GoogleOAuthSettings;

/// Errors from the Google OAuth flow
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("OAuth provider rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid response from OAuth provider: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile returned by the userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account id
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google sign-in (authorization code flow)
pub struct GoogleOAuthClient {
    settings: GoogleOAuthSettings,
    client: Client,
}

impl GoogleOAuthClient {
    pub fn new(settings: GoogleOAuthSettings) -> Result<Self, OAuthError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { settings, client })
    }

    /// Consent screen URL carrying the signed `state`
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            self.settings.auth_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_url),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Trade the authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Google token exchange failed ({}): {}", status, body);
            return Err(OAuthError::Rejected(format!("token exchange returned {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Fetch the signed-in account's profile
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .client
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Rejected(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn settings(base: &str) -> GoogleOAuthSettings {
        GoogleOAuthSettings {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:4000/api/auth/google/callback".to_string(),
            auth_url: format!("{}/auth", base),
            token_url: format!("{}/token", base),
            userinfo_url: format!("{}/userinfo", base),
        }
    }

    #[test]
    fn test_authorize_url_encodes_params() {
        let client = GoogleOAuthClient::new(settings("https://accounts.example")).unwrap();
        let url = client.authorize_url("abc.def");

        assert!(url.starts_with("https://accounts.example/auth?client_id=client-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4000%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc.def"));
    }

    #[tokio::test]
    async fn test_exchange_and_profile() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded("code".into(), "the-code".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sub":"g-42","email":"fan@example.com","email_verified":true,"name":"Film Fan"}"#)
            .create_async()
            .await;

        let client = GoogleOAuthClient::new(settings(&server.url())).unwrap();
        let token = client.exchange_code("the-code").await.unwrap();
        let profile = client.fetch_profile(&token).await.unwrap();

        assert_eq!(token, "at-1");
        assert_eq!(profile.sub, "g-42");
        assert!(profile.email_verified);
        assert!(profile.picture.is_none());
    }

    #[tokio::test]
    async fn test_rejected_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = GoogleOAuthClient::new(settings(&server.url())).unwrap();
        let err = client.exchange_code("stale").await.unwrap_err();

        assert!(matches!(err, OAuthError::Rejected(_)));
    }
}
