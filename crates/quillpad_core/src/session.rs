//! Anonymous session identity.
//!
//! A session is requested fire-and-forget at startup and is not consumed by
//! the editor logic: it exists so a future server can attach authorization
//! to store operations. Sign-in failure is logged and the app proceeds
//! unauthenticated-equivalent.

use async_trait::async_trait;

use crate::error::Result;

/// An ambient session identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque user id issued by the provider.
    pub user_id: String,
    /// Whether the session is anonymous (always true for [`AnonymousIdentity`]).
    pub is_anonymous: bool,
}

/// Issues session identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Request an anonymous session.
    async fn sign_in_anonymously(&self) -> Result<Session>;
}

/// Local provider that mints a random anonymous identity.
#[derive(Debug, Default)]
pub struct AnonymousIdentity;

impl AnonymousIdentity {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn sign_in_anonymously(&self) -> Result<Session> {
        Ok(Session {
            user_id: uuid::Uuid::new_v4().to_string(),
            is_anonymous: true,
        })
    }
}

/// Fire-and-forget sign-in used at app start.
///
/// Returns the session on success; logs and returns `None` on failure so the
/// editor remains usable without an identity.
pub async fn sign_in(provider: &dyn IdentityProvider) -> Option<Session> {
    match provider.sign_in_anonymously().await {
        Ok(session) => {
            log::info!("[Session] Signed in anonymously as {}", session.user_id);
            Some(session)
        }
        Err(e) => {
            log::error!("[Session] Anonymous sign-in failed: {}", e);
            None
        }
    }
}
