use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::api::GameApi;
use crate::credentials::Credential;
use crate::error::ApiResult;
use crate::token_store::{TokenMap, TokenStore};

/// URL-safe alphabet that tolerates both padded and unpadded input.
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// What a bearer token says about its own lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// No `exp` claim.
    Perpetual,
    /// `exp` claim in epoch seconds.
    ExpiresAt(i64),
    /// The payload segment could not be decoded.
    Malformed,
}

impl TokenExpiry {
    pub fn is_expired_at(self, now: i64) -> bool {
        match self {
            TokenExpiry::Perpetual => false,
            TokenExpiry::ExpiresAt(exp) => now > exp,
            TokenExpiry::Malformed => true,
        }
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// Read the `exp` claim from the middle segment of a JWT-like token.
pub fn token_expiry(token: &str) -> TokenExpiry {
    let Some(segment) = token.split('.').nth(1) else {
        return TokenExpiry::Malformed;
    };
    // Accept both base64 alphabets.
    let segment = segment.replace('+', "-").replace('/', "_");
    let Ok(bytes) = JWT_SEGMENT.decode(segment.trim_end_matches('=')) else {
        return TokenExpiry::Malformed;
    };
    let Ok(claims) = serde_json::from_slice::<Claims>(&bytes) else {
        return TokenExpiry::Malformed;
    };
    match claims.exp {
        None | Some(serde_json::Value::Null) => TokenExpiry::Perpetual,
        Some(serde_json::Value::Number(n)) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
        {
            // A zero `exp` carries no expiry.
            Some(0) => TokenExpiry::Perpetual,
            Some(exp) => TokenExpiry::ExpiresAt(exp),
            None => TokenExpiry::Malformed,
        },
        Some(_) => TokenExpiry::Malformed,
    }
}

/// Whether a cached token must be replaced, logging what was found.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    let expiry = token_expiry(token);
    match expiry {
        TokenExpiry::ExpiresAt(exp) => {
            if let Some(at) = DateTime::from_timestamp(exp, 0) {
                info!(
                    "Token expires on: {}",
                    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                );
            }
            let expired = expiry.is_expired_at(now.timestamp());
            if expired {
                info!("Has the token expired? Yes, you need to replace the token");
            } else {
                info!("Has the token expired? Not yet, you can continue using the token");
            }
            expired
        }
        TokenExpiry::Perpetual => {
            warn!("Perpetual token, expiration time cannot be read");
            false
        }
        TokenExpiry::Malformed => {
            error!("Error: token payload could not be decoded");
            true
        }
    }
}

/// Hands out a usable bearer token per account, backed by the token file.
pub struct SessionManager {
    store: TokenStore,
    tokens: TokenMap,
}

impl SessionManager {
    pub fn new(store: TokenStore, tokens: TokenMap) -> Self {
        Self { store, tokens }
    }

    /// Load the cache through `store` and keep it for the rest of the run.
    pub fn open(store: TokenStore) -> anyhow::Result<Self> {
        let tokens = store.load()?;
        Ok(Self::new(store, tokens))
    }

    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }

    /// Return the cached token for `credential`, authenticating when it is
    /// missing or expired. A fresh token is written to the token file at once.
    pub async fn token_for<A: GameApi + ?Sized>(
        &mut self,
        api: &A,
        credential: &Credential,
    ) -> ApiResult<String> {
        let user_id = credential.user_id();
        if let Some(token) = self.tokens.get(&user_id)
            && !is_expired(token, Utc::now())
        {
            return Ok(token.clone());
        }

        info!("Need to get new token for account {user_id}...");
        let token = api.authenticate(&credential.auth_payload()).await?;
        info!("Successfully obtained token for account {user_id}");

        self.tokens.insert(user_id.clone(), token.clone());
        match self.store.save(&self.tokens) {
            Ok(()) => info!("New token has been saved for account {user_id}"),
            Err(e) => error!("Failed to save token for account {user_id}: {e:#}"),
        }
        Ok(token)
    }
}
