use serde::Serialize;

use super::loader::SessionLoader;
use super::snapshot::SessionSnapshot;

/// Authentication state the app root derives from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Authenticated { user_id: String },
    Guest,
    /// Secure store denied access; stored credentials can no longer be trusted.
    ReauthRequired { reason: String },
}

impl AuthState {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        match (snapshot.auth_token(), snapshot.user_id()) {
            (Some(_), Some(user_id)) => Self::Authenticated {
                user_id: user_id.to_string(),
            },
            _ => Self::Guest,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    pub auth: AuthState,
    pub snapshot: SessionSnapshot,
}

impl SessionLoader {
    /// Startup path: optimistic load, then explicit fallback on access denial.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        match self.load_initial_data().await {
            Ok(snapshot) => {
                let auth = AuthState::from_snapshot(&snapshot);
                tracing::info!(target: "storefront.session", ?auth, "session ready");
                BootstrapOutcome { auth, snapshot }
            }
            Err(denied) => {
                tracing::warn!(
                    target: "storefront.session",
                    reason = %denied.reason,
                    "falling back to plain store, re-authentication required"
                );
                let snapshot = self.get_fallback_snapshot().await;
                BootstrapOutcome {
                    auth: AuthState::ReauthRequired {
                        reason: denied.reason,
                    },
                    snapshot,
                }
            }
        }
    }
}
