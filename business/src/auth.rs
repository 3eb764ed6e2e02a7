//! Supabase Auth (GoTrue) client and the signed-in session state.
//!
//! [`AuthState`] publishes [`AuthStatus`] over a `tokio::sync::watch`
//! channel; views subscribe and re-render on sign-in, sign-out, and profile
//! updates (the onboarding flag lives in the user's metadata).

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::BusinessConfig;
use crate::http::{Client, RequestBuilder, Response};

pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding_completed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Rejected by the auth server, with its message.
    #[error("{0}")]
    Rejected(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected auth response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    pub fn onboarding_completed(&self) -> bool {
        self.user_metadata
            .get(ONBOARDING_COMPLETED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now().timestamp())
    }
}

/// Result of a sign-up: a live session, or a pending email confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(AuthUser),
}

pub trait AuthClient: Clone + Send + Sync + 'static {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignUpOutcome, AuthError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn refresh(&self, refresh_token: &str)
    -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn get_user(&self, access_token: &str)
    -> impl Future<Output = Result<AuthUser, AuthError>> + Send;

    fn update_user_metadata(
        &self,
        access_token: &str,
        data: Value,
    ) -> impl Future<Output = Result<AuthUser, AuthError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}

#[derive(Debug, Clone)]
pub struct GoTrueClient {
    config: BusinessConfig,
}

#[derive(Deserialize)]
struct SessionReply {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl From<SessionReply> for Session {
    fn from(reply: SessionReply) -> Self {
        let expires_at = reply
            .expires_at
            .or_else(|| reply.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Self {
            access_token: reply.access_token,
            refresh_token: reply.refresh_token,
            expires_at,
            user: reply.user,
        }
    }
}

impl GoTrueClient {
    pub fn new(config: BusinessConfig) -> Self {
        Self { config }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AuthError> {
        let response = builder
            .header("apikey", self.config.supabase_anon_key.as_str())
            .send()
            .await
            .map_err(|e| AuthError::Connection(e.message))?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(AuthError::Rejected(response.error_message()))
        }
    }

    fn json(builder: RequestBuilder, body: &Value) -> Result<RequestBuilder, AuthError> {
        builder.json(body).map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn token(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let url = format!("{}?grant_type={grant_type}", self.config.auth_url("token"));
        let response = self.send(Self::json(Client::post(url), &body)?).await?;
        response
            .json::<SessionReply>()
            .map(Session::from)
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

impl AuthClient for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { ONBOARDING_COMPLETED_KEY: false },
        });
        let response = self
            .send(Self::json(Client::post(self.config.auth_url("signup")), &body)?)
            .await?;

        // Autoconfirm projects answer with a session, others with the bare user
        if let Ok(reply) = response.json::<SessionReply>() {
            return Ok(SignUpOutcome::SignedIn(reply.into()));
        }
        response
            .json::<AuthUser>()
            .map(SignUpOutcome::ConfirmationRequired)
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.token("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .send(Client::get(self.config.auth_url("user")).bearer(access_token))
            .await?;
        response.json().map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn update_user_metadata(
        &self,
        access_token: &str,
        data: Value,
    ) -> Result<AuthUser, AuthError> {
        let builder = Client::put(self.config.auth_url("user")).bearer(access_token);
        let response = self
            .send(Self::json(builder, &json!({ "data": data }))?)
            .await?;
        response.json().map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.send(Client::post(self.config.auth_url("logout")).bearer(access_token))
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthStatus {
    /// Session not yet resolved.
    #[default]
    Loading,
    SignedOut,
    SignedIn(Session),
}

impl AuthStatus {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            _ => None,
        }
    }
}

/// The current session, broadcast to subscribers.
pub struct AuthState<A> {
    client: A,
    status: watch::Sender<AuthStatus>,
}

impl<A: AuthClient> AuthState<A> {
    pub fn new(client: A) -> Self {
        let (status, _) = watch::channel(AuthStatus::Loading);
        Self { client, status }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> AuthStatus {
        self.status.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.status.borrow().session().cloned()
    }

    pub fn onboarding_completed(&self) -> bool {
        self.status
            .borrow()
            .session()
            .is_some_and(|session| session.user.onboarding_completed())
    }

    /// Resolves a saved session: refreshes it when expired, then reloads the user.
    /// Any failure leaves the state signed out.
    pub async fn restore(&self, saved: Option<Session>) -> AuthStatus {
        let status = match saved {
            None => AuthStatus::SignedOut,
            Some(session) => match self.revalidate(session).await {
                Ok(session) => AuthStatus::SignedIn(session),
                Err(err) => {
                    warn!("Saved session could not be restored: {err}");
                    AuthStatus::SignedOut
                }
            },
        };
        self.status.send_replace(status.clone());
        status
    }

    async fn revalidate(&self, session: Session) -> Result<Session, AuthError> {
        let mut session = if session.is_expired() {
            self.client.refresh(&session.refresh_token).await?
        } else {
            session
        };
        session.user = self.client.get_user(&session.access_token).await?;
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.client.sign_in(email.trim(), password).await?;
        info!("Signed in as {}", session.user.id);
        self.status
            .send_replace(AuthStatus::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.client.sign_up(email.trim(), password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.status
                .send_replace(AuthStatus::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    /// Always ends signed out; a failed remote logout is only logged.
    pub async fn sign_out(&self) {
        if let Some(session) = self.session()
            && let Err(err) = self.client.sign_out(&session.access_token).await
        {
            warn!("Remote sign out failed: {err}");
        }
        self.status.send_replace(AuthStatus::SignedOut);
    }

    /// Sets `onboarding_completed` in the profile metadata.
    pub async fn complete_onboarding(&self) -> Result<(), AuthError> {
        let session = self.session().ok_or(AuthError::NotSignedIn)?;
        let user = self
            .client
            .update_user_metadata(
                &session.access_token,
                json!({ ONBOARDING_COMPLETED_KEY: true }),
            )
            .await?;
        self.status.send_modify(|status| {
            if let AuthStatus::SignedIn(session) = status {
                session.user = user;
            }
        });
        Ok(())
    }
}
