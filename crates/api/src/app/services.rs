//! Infrastructure wiring shared by every handler.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use reading_auth::{CredentialError, CredentialVerifier, TokenCodec};
use reading_core::Identity;
use reading_infra::{InMemoryStore, PostgresStore, Store};

use crate::app::errors::ApiError;
use crate::config::ApiConfig;

pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenCodec>,
    pub credentials: Arc<CredentialVerifier>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenCodec>, credentials: Arc<CredentialVerifier>) -> Self {
        Self {
            store,
            tokens,
            credentials,
        }
    }

    /// Build the production wiring: Postgres when `DATABASE_URL` is set,
    /// otherwise a process-local in-memory store.
    pub async fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let tokens = TokenCodec::new(config.token_config()?);
        let credentials = CredentialVerifier::new(config.credentials)?;

        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let store = PostgresStore::connect(url)
                    .await
                    .context("failed to connect to postgres")?;
                store.ensure_schema().await.context("failed to prepare schema")?;
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; records live in memory only");
                Arc::new(InMemoryStore::new())
            }
        };

        Ok(Self::new(store, Arc::new(tokens), Arc::new(credentials)))
    }

    /// Hash a new password off the async runtime (Argon2 is deliberately slow).
    pub async fn hash_password(&self, secret: String) -> Result<String, ApiError> {
        let credentials = Arc::clone(&self.credentials);
        let digest = tokio::task::spawn_blocking(move || credentials.hash(&secret))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))??;
        Ok(digest)
    }

    /// Check an e-mail/password pair and return the account's identity.
    ///
    /// An unknown e-mail burns one verification's worth of work and fails
    /// exactly like a wrong password.
    pub async fn check_credentials(&self, email: &str, password: String) -> Result<Identity, ApiError> {
        let user = self.store.find_user_by_email(email).await?;
        let credentials = Arc::clone(&self.credentials);

        let outcome = tokio::task::spawn_blocking(move || match user {
            Some(user) => credentials.verify(&user.password_hash, &password).map(|()| user.id),
            None => {
                credentials.burn(&password);
                Err(CredentialError::MismatchedCredential)
            }
        })
        .await
        .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?;

        outcome.map_err(|e| {
            tracing::info!("login rejected");
            ApiError::from(e)
        })
    }

    pub fn issue_token(&self, identity: Identity) -> Result<String, ApiError> {
        Ok(self.tokens.issue(identity, Utc::now())?)
    }
}
