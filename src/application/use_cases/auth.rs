//! The per-request authentication pipeline.
//!
//! Stages run in a fixed order over an explicit [`AuthContext`]:
//! extract -> verify -> refresh (only when the access token has expired).
//! The HTTP layer turns the final context into either an [`AuthSession`] for the
//! route handler or a terminal rejection, and applies cookies in one step.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::{
    app_error::AppResult,
    credentials::{self, CredentialPair, CredentialSource, CredentialSources},
    jwt::{self, Claims, Verification},
};

/// Port to the auth service's token-refresh endpoint.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchanges a refresh token for a freshly minted access token.
    async fn refresh(&self, refresh_token: &str) -> AppResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("no access token found on the request")]
    CredentialMissing,
    #[error("access token is malformed or has a bad signature")]
    InvalidCredential,
    #[error("access token has expired")]
    CredentialExpired,
    #[error("could not exchange the refresh token for a new access token")]
    RefreshFailed,
    #[error("access token was rejected")]
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Pending,
    Verified(Claims),
    /// A new access token was minted from the refresh token.
    Refreshed,
    Failed(AuthFailure),
}

/// Request-scoped state threaded through the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub source: Option<CredentialSource>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub status: AuthStatus,
}

impl AuthContext {
    pub fn from_sources(sources: &CredentialSources<'_>) -> Self {
        match credentials::extract(sources) {
            Ok(Some((source, pair))) => Self {
                source: Some(source),
                access_token: Some(pair.access_token),
                refresh_token: pair.refresh_token,
                status: AuthStatus::Pending,
            },
            Ok(None) => Self {
                source: None,
                access_token: None,
                refresh_token: None,
                status: AuthStatus::Failed(AuthFailure::CredentialMissing),
            },
            Err(err) => {
                tracing::warn!(error = %err, "Query-string credentials could not be decoded");
                Self {
                    source: Some(CredentialSource::Query),
                    access_token: None,
                    refresh_token: None,
                    status: AuthStatus::Failed(AuthFailure::InvalidCredential),
                }
            }
        }
    }

    pub fn into_session(self) -> Result<AuthSession, AuthFailure> {
        let refreshed = matches!(self.status, AuthStatus::Refreshed);
        let claims = match self.status {
            AuthStatus::Verified(claims) => Some(claims),
            AuthStatus::Refreshed => None,
            AuthStatus::Failed(failure) => return Err(failure),
            // Verification never ran.
            AuthStatus::Pending => return Err(AuthFailure::Rejected),
        };
        let access_token = self.access_token.ok_or(AuthFailure::CredentialMissing)?;
        Ok(AuthSession {
            access_token,
            refresh_token: self.refresh_token,
            claims,
            refreshed,
        })
    }
}

/// What a route handler sees once the pipeline let the request through.
/// Its presence on a request means the caller is authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    /// The token to present to sibling services; the new one after a refresh.
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Decoded claims; `None` after a refresh since the new token was not decoded.
    pub claims: Option<Claims>,
    pub refreshed: bool,
}

impl AuthSession {
    pub fn credentials(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

pub struct AuthUseCases {
    secret: SecretString,
    leeway_secs: u64,
    refresher: Arc<dyn TokenRefresher>,
    refresh_timeout: Duration,
}

impl AuthUseCases {
    pub fn new(
        secret: SecretString,
        leeway_secs: u64,
        refresher: Arc<dyn TokenRefresher>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            secret,
            leeway_secs,
            refresher,
            refresh_timeout,
        }
    }

    /// Runs every stage for one request.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        sources: &CredentialSources<'_>,
    ) -> Result<AuthSession, AuthFailure> {
        let ctx = AuthContext::from_sources(sources);
        let ctx = self.verify_stage(ctx);
        let ctx = self.refresh_stage(ctx).await;
        ctx.into_session()
    }

    pub fn verify_stage(&self, mut ctx: AuthContext) -> AuthContext {
        if ctx.status != AuthStatus::Pending {
            return ctx;
        }
        let Some(token) = ctx.access_token.as_deref() else {
            ctx.status = AuthStatus::Failed(AuthFailure::CredentialMissing);
            return ctx;
        };
        let source = ctx.source.map(|s| s.as_str());

        ctx.status = match jwt::verify(token, &self.secret, self.leeway_secs) {
            Verification::Valid(claims) => {
                tracing::debug!(source, sub = ?claims.sub, "Access token verified");
                AuthStatus::Verified(claims)
            }
            Verification::Expired => {
                tracing::info!(source, "Access token expired, refresh required");
                AuthStatus::Failed(AuthFailure::CredentialExpired)
            }
            Verification::Invalid(reason) => {
                tracing::warn!(source, %reason, "Access token invalid");
                AuthStatus::Failed(AuthFailure::InvalidCredential)
            }
            Verification::Rejected(reason) => {
                tracing::warn!(source, %reason, "Access token rejected");
                AuthStatus::Failed(AuthFailure::Rejected)
            }
        };
        ctx
    }

    /// Only acts on an expired access token. Makes at most one call to the auth
    /// service, bounded by the configured timeout.
    pub async fn refresh_stage(&self, mut ctx: AuthContext) -> AuthContext {
        if ctx.status != AuthStatus::Failed(AuthFailure::CredentialExpired) {
            return ctx;
        }
        let Some(refresh_token) = ctx.refresh_token.clone() else {
            tracing::warn!("Access token expired and no refresh token was presented");
            ctx.status = AuthStatus::Failed(AuthFailure::RefreshFailed);
            return ctx;
        };

        let exchange = self.refresher.refresh(&refresh_token);
        ctx.status = match tokio::time::timeout(self.refresh_timeout, exchange).await {
            Ok(Ok(new_token)) if !new_token.is_empty() => {
                tracing::info!("Access token refreshed");
                ctx.access_token = Some(new_token);
                AuthStatus::Refreshed
            }
            Ok(Ok(_)) => {
                tracing::warn!("Auth service returned an empty access token");
                AuthStatus::Failed(AuthFailure::RefreshFailed)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Refresh exchange failed");
                AuthStatus::Failed(AuthFailure::RefreshFailed)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.refresh_timeout.as_millis() as u64,
                    "Refresh exchange timed out"
                );
                AuthStatus::Failed(AuthFailure::RefreshFailed)
            }
        };
        ctx
    }
}
