use std::sync::{Arc, RwLock};

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use reqwest::{Client, RequestBuilder, Response};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use nearnest_store::{LocalStore, flags};
use nearnest_types::api::{
    AuthErrorBody, AuthUser, Claims, OtpRequest, RefreshRequest, Session, VerifyOtpRequest,
};
use nearnest_types::events::AuthEvent;

use crate::config::BackendConfig;
use crate::error::ApiError;

/// Refresh the access token when it has less than this many seconds left.
const REFRESH_MARGIN_SECS: i64 = 60;

/// GoTrue client holding the current session and publishing identity changes.
pub struct AuthClient {
    client: Client,
    auth_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    /// Current access token, for long-lived consumers such as Realtime sockets
    token: watch::Sender<Option<String>>,
    store: Option<Arc<LocalStore>>,
}

impl AuthClient {
    /// `store`, when given, keeps the session across process restarts.
    pub fn new(client: Client, config: &BackendConfig, store: Option<Arc<LocalStore>>) -> Self {
        let (events, _) = broadcast::channel(16);
        let (token, _) = watch::channel(None);
        Self {
            client,
            auth_url: config.auth_url(),
            api_key: config.anon_key().to_string(),
            session: RwLock::new(None),
            events,
            token,
            store,
        }
    }

    /// Subscribe to identity changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Load the saved session, if any, and announce it. This is the first
    /// identity check at startup.
    pub fn restore(&self) -> Option<AuthUser> {
        let session = self.store.as_deref().and_then(flags::load_session)?;
        let user = session.user.clone();
        self.write_session(Some(session));
        info!("Restored session for {}", user.id);
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        Some(user)
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.read_session().map(|s| s.user)
    }

    /// Token for data requests: the session's access token, refreshed when
    /// close to expiry, or the anon key when signed out.
    pub async fn bearer(&self) -> String {
        let Some(session) = self.read_session() else {
            return self.api_key.clone();
        };

        if !token_expiring(&session.access_token, chrono::Utc::now().timestamp()) {
            return session.access_token;
        }

        match self.refresh().await {
            Ok(refreshed) => refreshed.access_token,
            Err(e) => {
                warn!("Token refresh failed, using current token: {}", e);
                session.access_token
            }
        }
    }

    /// Access token of the current session without refreshing.
    pub fn access_token(&self) -> Option<String> {
        self.read_session().map(|s| s.access_token)
    }

    /// Follow the access token as it is refreshed, replaced or cleared.
    pub fn watch_token(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    /// Send a sign-in link (and one-time code) to `email`.
    pub async fn sign_in_with_otp(&self, email: &str, redirect_to: Option<&str>) -> Result<(), ApiError> {
        let req = OtpRequest {
            email: email.trim(),
            create_user: true,
            email_redirect_to: redirect_to,
        };
        let response = self
            .request(self.client.post(format!("{}/otp", self.auth_url)))
            .json(&req)
            .send()
            .await?;

        check(response).await?;
        info!("Sign-in link sent to {}", email.trim());
        Ok(())
    }

    /// Exchange the emailed one-time code for a session.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthUser, ApiError> {
        let req = VerifyOtpRequest {
            kind: "email",
            email: email.trim(),
            token: code.trim(),
        };
        let response = self
            .request(self.client.post(format!("{}/verify", self.auth_url)))
            .json(&req)
            .send()
            .await?;

        let session: Session = check(response).await?.json().await?;
        Ok(self.signed_in(session))
    }

    pub async fn sign_in_anonymously(&self) -> Result<AuthUser, ApiError> {
        let response = self
            .request(self.client.post(format!("{}/signup", self.auth_url)))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let session: Session = check(response).await?.json().await?;
        Ok(self.signed_in(session))
    }

    pub async fn refresh(&self) -> Result<Session, ApiError> {
        let refresh_token = self
            .read_session()
            .map(|s| s.refresh_token)
            .ok_or(ApiError::NotAuthenticated)?;

        let response = self
            .request(self.client.post(format!("{}/token", self.auth_url)))
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let session: Session = check(response).await?.json().await?;
        self.save(&session);
        self.write_session(Some(session.clone()));
        let _ = self.events.send(AuthEvent::TokenRefreshed(session.user.clone()));
        Ok(session)
    }

    /// Clear the session. The remote logout is best-effort; the local
    /// identity is gone either way.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        if let Some(token) = self.access_token() {
            let result = self
                .client
                .post(format!("{}/logout", self.auth_url))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!("Remote logout returned {}", response.status());
                }
                Err(e) => warn!("Remote logout failed: {}", e),
                Ok(_) => {}
            }
        }

        self.write_session(None);
        if let Some(store) = &self.store {
            flags::clear_session(store);
        }
        info!("Signed out");
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    fn signed_in(&self, session: Session) -> AuthUser {
        let user = session.user.clone();
        self.save(&session);
        self.write_session(Some(session));
        info!("Signed in as {}", user.id);
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        user
    }

    fn save(&self, session: &Session) {
        if let Some(store) = &self.store {
            flags::save_session(store, session);
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.api_key).bearer_auth(&self.api_key)
    }

    fn read_session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_session(&self, session: Option<Session>) {
        let token = session.as_ref().map(|s| s.access_token.clone());
        self.token.send_if_modified(|current| {
            if *current == token {
                return false;
            }
            *current = token;
            true
        });

        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

/// Whether `token` expires within the refresh margin of `now`. Tokens that
/// cannot be decoded are left alone; the backend will reject them if needed.
pub fn token_expiring(token: &str, now: i64) -> bool {
    match token_claims(token) {
        Some(claims) => (claims.exp as i64) - now < REFRESH_MARGIN_SECS,
        None => false,
    }
}

/// Read the claims of an access token without verifying its signature.
pub fn token_claims(token: &str) -> Option<Claims> {
    let header = decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

async fn check(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body: AuthErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| if text.is_empty() { "Unknown error".to_string() } else { text.clone() });

    Err(ApiError::Backend {
        status,
        code: body.error_code,
        message,
    })
}
