//! Durable session store.
//!
//! The store is the single point of read/write for everything the
//! client persists across reloads: the session itself, the remembered
//! login email per role, and the theme preference. It keeps a
//! write-through cache over one TOML file, so every `set`/`clear` is
//! immediately visible to subsequent `get` calls and survives a
//! process restart.
//!
//! A missing or malformed state file loads as the default state with
//! an anonymous session. Storage never surfaces parse errors to
//! readers.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use disha_core::error::Result;
use disha_core::session::{Role, Session};

use crate::paths::DishaPaths;

/// Theme preference persisted alongside the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Everything the client persists, in one file.
///
/// Fields all default so state files written by older builds still
/// parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClientState {
    // Scalar fields first so the TOML writer emits them before the
    // session table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remembered_email_student: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remembered_email_admin: Option<String>,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    session: Session,
}

/// Typed accessor over the persisted client state.
///
/// Cloning the store shares the same cache and file, so the login flow
/// and the navigation guard always observe the same session value.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<Mutex<ClientState>>,
    path: PathBuf,
}

impl SessionStore {
    /// Opens the store rooted at the given paths, loading existing
    /// state if any. The state directory is created on first write.
    pub fn open(paths: &DishaPaths) -> Self {
        let path = paths.state_file();
        let state = Self::load(&path);
        Self {
            state: Arc::new(Mutex::new(state)),
            path,
        }
    }

    fn load(path: &PathBuf) -> ClientState {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return ClientState::default(),
        };
        match toml::from_str(&content) {
            Ok(state) => state,
            Err(err) => {
                // A corrupt file means no session, never an error.
                tracing::warn!(
                    "[SessionStore] Discarding malformed state file at {}: {}",
                    path.display(),
                    err
                );
                ClientState::default()
            }
        }
    }

    fn save(&self, state: &ClientState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Returns the current session. Anonymous when nothing is stored.
    pub fn get(&self) -> Session {
        self.state.lock().expect("session store poisoned").session.clone()
    }

    /// Replaces the session and persists immediately.
    pub fn set(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock().expect("session store poisoned");
        state.session = session;
        self.save(&state)
    }

    /// Signs the caller out. Preferences (remembered email, theme)
    /// survive a sign-out.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().expect("session store poisoned");
        state.session = Session::Anonymous;
        self.save(&state)
    }

    /// The remembered login email for a role's login form, if any.
    pub fn remembered_email(&self, role: Role) -> Option<String> {
        let state = self.state.lock().expect("session store poisoned");
        match role {
            Role::Student => state.remembered_email_student.clone(),
            Role::Admin => state.remembered_email_admin.clone(),
        }
    }

    /// Remembers (or forgets, with `None`) the login email for a role.
    pub fn set_remembered_email(&self, role: Role, email: Option<String>) -> Result<()> {
        let mut state = self.state.lock().expect("session store poisoned");
        match role {
            Role::Student => state.remembered_email_student = email,
            Role::Admin => state.remembered_email_admin = email,
        }
        self.save(&state)
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().expect("session store poisoned").theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        let mut state = self.state.lock().expect("session store poisoned");
        state.theme = theme;
        self.save(&state)
    }
}
