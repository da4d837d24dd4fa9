use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{KeyValueStore, SessionError};

pub const AUTHENTICATED_KEY: &str = "authenticated";

/// Grants access to the catalog once the shared MPIN has been entered.
///
/// The grant is a flag in the injected store and has no expiry; it lasts until
/// [`SessionGate::logout`].
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn KeyValueStore>,
    secret: String,
}

impl SessionGate {
    pub fn new(store: Arc<dyn KeyValueStore>, secret: impl Into<String>) -> Self {
        Self { store, secret: secret.into() }
    }

    /// Whether a previous login is on record. An unreadable store counts as
    /// logged out.
    pub fn is_authenticated(&self) -> bool {
        match self.store.get(AUTHENTICATED_KEY) {
            Ok(flag) => flag.as_deref() == Some("true"),
            Err(e) => {
                warn!(error = %e, "Could not read session flag");
                false
            }
        }
    }

    pub fn require(&self) -> Result<(), SessionError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(SessionError::NotAuthenticated)
        }
    }

    #[instrument(skip(self, pin))]
    pub fn login(&self, pin: &str) -> Result<(), SessionError> {
        if pin != self.secret {
            warn!("Rejected MPIN");
            return Err(SessionError::AuthError);
        }
        self.store.set(AUTHENTICATED_KEY, "true")?;
        info!("Session authenticated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.remove(AUTHENTICATED_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}
