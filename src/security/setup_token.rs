//! Setup-token issuance
//!
//! During first-time setup the user is read a short code to type into the
//! web app. The code is 1:1 with the voice-assistant identity: asking again
//! ("repeat the token") must return the same code, never mint a new one.
//!
//! Two layers keep that true under concurrent setup requests:
//! - inside one process, a per-identity async mutex makes lookup, generate
//!   and persist a single critical section
//! - across processes, the store only inserts when the identity has no code
//!   and always reports the code on record, which the service returns
//!   instead of its own candidate

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;

use crate::{Error, Result};

/// Setup code length
pub const SETUP_CODE_LENGTH: usize = 6;

/// Attempts at finding a code no other identity holds
const MAX_CODE_ATTEMPTS: usize = 8;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Result of trying to persist a candidate code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Identity now has this code on record (possibly an earlier one)
    Stored(String),
    /// Candidate code already belongs to another identity
    CodeTaken,
}

/// Storage for identity → setup code mappings
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Look up the code issued to `identity`
    async fn find_token_by_identity(&self, identity: &str) -> Result<Option<String>>;

    /// Store `code` for `identity` unless it already has one
    ///
    /// Completes only once the mapping is durable.
    async fn persist_token(&self, identity: &str, code: &str) -> Result<PersistOutcome>;

    /// Resolve a code back to the identity it was issued to
    async fn find_identity_by_token(&self, code: &str) -> Result<Option<String>>;
}

/// Issues and looks up setup codes
#[derive(Clone)]
pub struct SetupTokenService {
    store: Arc<dyn TokenStore>,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl SetupTokenService {
    /// Create a service over a token store
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the setup code for `identity`, issuing one if needed
    ///
    /// The returned code is always the persisted one.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or no unused code could be found
    pub async fn obtain_token(&self, identity: &str) -> Result<String> {
        let lock = self.identity_lock(identity);
        let result = {
            let _guard = lock.lock().await;
            self.obtain_locked(identity).await
        };
        self.release_lock(identity, lock);
        result
    }

    /// Resolve a code to the identity it belongs to
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub async fn identity_for(&self, code: &str) -> Result<Option<String>> {
        self.store
            .find_identity_by_token(&code.trim().to_ascii_uppercase())
            .await
    }

    async fn obtain_locked(&self, identity: &str) -> Result<String> {
        if let Some(code) = self.store.find_token_by_identity(identity).await? {
            tracing::debug!(user_id = identity, "reusing existing setup code");
            return Ok(code);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = generate_code(SETUP_CODE_LENGTH);

            match self.store.persist_token(identity, &candidate).await? {
                PersistOutcome::Stored(code) => {
                    if code == candidate {
                        tracing::info!(user_id = identity, "issued setup code");
                    } else {
                        tracing::debug!(user_id = identity, "concurrent writer issued code first");
                    }
                    return Ok(code);
                }
                PersistOutcome::CodeTaken => {
                    tracing::debug!(user_id = identity, attempt, "setup code collision");
                }
            }
        }

        Err(Error::Database(format!(
            "no unused setup code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    fn identity_lock(&self, identity: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(identity.to_string()).or_default())
    }

    /// Drop the identity's lock entry once no other caller holds it
    fn release_lock(&self, identity: &str, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(identity).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(identity);
        }
    }

    #[cfg(test)]
    fn tracked_identities(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Generate a random uppercase alphanumeric code
fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())]))
        .collect()
}
