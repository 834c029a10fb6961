//! Password auth endpoints (`/auth/v1`).

use anyhow::Result;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{BackendClient, send, send_json};
use crate::session::{Session, User};

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The project auto-confirms accounts; a session was issued.
    SignedIn(Session),
    /// The account exists but must be verified (e.g. via email) first.
    ConfirmationRequired { email: Option<String> },
}

/// Token grant response shared by password and refresh grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs))
            .unwrap_or(now);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

impl BackendClient {
    /// Exchanges email and password for a session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let builder = self
            .request(Method::POST, url, None)?
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = send_json(builder, "sign in").await?;
        Ok(token.into_session(now_secs()))
    }

    /// Creates an account.
    ///
    /// Projects with auto-confirm return a session; otherwise only the user
    /// object comes back and no session exists until the address is verified.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let url = self.endpoint("auth/v1/signup")?;
        let builder = self
            .request(Method::POST, url, None)?
            .json(&json!({ "email": email, "password": password }));
        let body: Value = send_json(builder, "sign up").await?;
        Ok(parse_sign_up(body, now_secs()))
    }

    /// Exchanges a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let builder = self
            .request(Method::POST, url, None)?
            .json(&json!({ "refresh_token": refresh_token }));
        let token: TokenResponse = send_json(builder, "refresh session").await?;
        Ok(token.into_session(now_secs()))
    }

    /// Revokes the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.endpoint("auth/v1/logout")?;
        send(self.request(Method::POST, url, Some(access_token))?, "sign out").await?;
        Ok(())
    }

    /// Fetches the user behind `access_token`.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        let url = self.endpoint("auth/v1/user")?;
        send_json(self.request(Method::GET, url, Some(access_token))?, "load user").await
    }
}

fn parse_sign_up(body: Value, now: i64) -> SignUpOutcome {
    if body.get("access_token").is_some()
        && let Ok(token) = serde_json::from_value::<TokenResponse>(body.clone())
    {
        return SignUpOutcome::SignedIn(token.into_session(now));
    }

    // Without a session the body is the user object itself (or wraps it).
    let user = body.get("user").unwrap_or(&body);
    let email = user
        .get("email")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    SignUpOutcome::ConfirmationRequired { email }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_with_session_is_signed_in() {
        let body = json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": "u-1", "email": "a@x.com" }
        });
        match parse_sign_up(body, 1_000) {
            SignUpOutcome::SignedIn(session) => {
                assert_eq!(session.user.id, "u-1");
                assert_eq!(session.expires_at, 4_600);
            }
            other => panic!("expected session, got {other:?}"),
        }
    }

    #[test]
    fn sign_up_without_session_requires_confirmation() {
        let body = json!({
            "id": "u-1",
            "email": "a@x.com",
            "confirmation_sent_at": "2024-01-01T00:00:00Z"
        });
        assert_eq!(
            parse_sign_up(body, 0),
            SignUpOutcome::ConfirmationRequired {
                email: Some("a@x.com".into())
            }
        );
    }

    #[test]
    fn explicit_expires_at_wins_over_expires_in() {
        let token = TokenResponse {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_in: Some(3600),
            expires_at: Some(50),
            user: User {
                id: "u".into(),
                email: None,
            },
        };
        assert_eq!(token.into_session(0).expires_at, 50);
    }
}
