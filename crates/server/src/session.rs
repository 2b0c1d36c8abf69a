//! # Session Store
//!
//! An explicit, injected session store keyed by session identifier. The
//! source system kept the installed-plugin registry in ambient process-wide
//! session state; here each session owns its registry so concurrent sessions
//! are isolated and independently testable.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shopadmin::{MenuDeclaration, PluginDescriptor};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// One imported plugin as recorded in a session: descriptor, menu
/// declarations, the raw (unadapted) schema statements, and the extracted
/// bundle's path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub info: PluginDescriptor,
    pub menus: Vec<MenuDeclaration>,
    pub schemas: Vec<String>,
    pub path: PathBuf,
}

/// A signed-in admin session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub admin_id: i64,
    pub username: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
    /// Imported plugins, keyed by slug. Last import for a given slug wins.
    pub installed_plugins: HashMap<String, InstalledPlugin>,
}

impl Session {
    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// In-memory store of active admin sessions.
pub struct SessionStore {
    lifetime: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(lifetime_secs: u64) -> Self {
        Self {
            lifetime: Duration::seconds(lifetime_secs as i64),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a fresh session with new id and CSRF token. Called on every
    /// successful login, so a login always rotates the session identifier.
    pub fn create(&self, admin_id: i64, username: &str) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            admin_id,
            username: username.to_string(),
            csrf_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + self.lifetime,
            installed_plugins: HashMap::new(),
        };
        self.sessions
            .write()
            .expect("session store lock poisoned")
            .insert(session.id.clone(), session.clone());
        session
    }

    /// Returns a snapshot of the session, pruning it if expired.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let expired = {
            let sessions = self.sessions.read().expect("session store lock poisoned");
            match sessions.get(session_id) {
                Some(session) if session.is_expired() => true,
                Some(session) => return Some(session.clone()),
                None => return None,
            }
        };
        if expired {
            self.destroy(session_id);
        }
        None
    }

    /// Removes a session. Returns whether it existed.
    pub fn destroy(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .expect("session store lock poisoned")
            .remove(session_id)
            .is_some()
    }

    /// Records an imported plugin in the session, replacing any earlier
    /// import with the same slug. Returns false if the session is gone.
    pub fn register_plugin(&self, session_id: &str, slug: &str, plugin: InstalledPlugin) -> bool {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        match sessions.get_mut(session_id) {
            Some(session) => {
                session
                    .installed_plugins
                    .insert(slug.to_string(), plugin);
                true
            }
            None => false,
        }
    }

    /// Returns the session's installed-plugin registry, empty if the session
    /// is gone.
    pub fn installed_plugins(&self, session_id: &str) -> HashMap<String, InstalledPlugin> {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .get(session_id)
            .map(|session| session.installed_plugins.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plugin(name: &str) -> InstalledPlugin {
        InstalledPlugin {
            info: PluginDescriptor {
                name: Some(name.to_string()),
                ..PluginDescriptor::default()
            },
            menus: Vec::new(),
            schemas: Vec::new(),
            path: PathBuf::from("/tmp/extracted"),
        }
    }

    #[test]
    fn create_and_get_roundtrip() {
        let store = SessionStore::new(3600);
        let session = store.create(1, "admin");

        let fetched = store.get(&session.id).expect("session should exist");
        assert_eq!(fetched.admin_id, 1);
        assert_eq!(fetched.username, "admin");
        assert_eq!(fetched.csrf_token, session.csrf_token);
    }

    #[test]
    fn every_login_rotates_the_session_id() {
        let store = SessionStore::new(3600);
        let first = store.create(1, "admin");
        let second = store.create(1, "admin");
        assert_ne!(first.id, second.id);
        assert_ne!(first.csrf_token, second.csrf_token);
    }

    #[test]
    fn destroyed_session_is_gone() {
        let store = SessionStore::new(3600);
        let session = store.create(1, "admin");
        assert!(store.destroy(&session.id));
        assert!(store.get(&session.id).is_none());
        assert!(!store.destroy(&session.id));
    }

    #[test]
    fn expired_session_is_pruned() {
        let store = SessionStore::new(0);
        let session = store.create(1, "admin");
        assert!(store.get(&session.id).is_none());
        // Pruned, not just hidden.
        assert!(!store.destroy(&session.id));
    }

    #[test]
    fn last_import_for_a_slug_wins() {
        let store = SessionStore::new(3600);
        let session = store.create(1, "admin");

        assert!(store.register_plugin(&session.id, "shop-plugin", sample_plugin("First")));
        assert!(store.register_plugin(&session.id, "shop-plugin", sample_plugin("Second")));

        let plugins = store.installed_plugins(&session.id);
        assert_eq!(plugins.len(), 1);
        assert_eq!(
            plugins["shop-plugin"].info.name.as_deref(),
            Some("Second")
        );
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(3600);
        let alpha = store.create(1, "admin");
        let beta = store.create(1, "admin");

        store.register_plugin(&alpha.id, "shop-plugin", sample_plugin("Alpha only"));

        assert_eq!(store.installed_plugins(&alpha.id).len(), 1);
        assert!(store.installed_plugins(&beta.id).is_empty());
    }

    #[test]
    fn register_plugin_on_missing_session_fails() {
        let store = SessionStore::new(3600);
        assert!(!store.register_plugin("no-such-session", "slug", sample_plugin("X")));
    }
}
