//! Admin gate for the trade library.
//!
//! Plain string comparison against configured passwords, with sessions kept
//! in memory. This hides the admin controls; it is not a security boundary.

use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct AuthGate {
    admin_password: String,
    delete_password: String,
    sessions: RwLock<HashSet<String>>,
}

impl AuthGate {
    pub fn new(admin_password: impl Into<String>, delete_password: impl Into<String>) -> Self {
        Self {
            admin_password: admin_password.into(),
            delete_password: delete_password.into(),
            sessions: RwLock::new(HashSet::new()),
        }
    }

    /// Returns a fresh session token when `password` is exactly the admin password.
    pub async fn login(&self, password: &str) -> Option<String> {
        if password != self.admin_password {
            warn!("admin login rejected");
            return None;
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.write().await.insert(token.clone());
        info!("admin logged in");
        Some(token)
    }

    /// Ends a session. Returns false if the token was not live.
    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token)
    }

    pub async fn is_admin(&self, token: &str) -> bool {
        self.sessions.read().await.contains(token)
    }

    pub fn verify_delete_password(&self, password: &str) -> bool {
        password == self.delete_password
    }
}
