//! Login and sign-out flows.
//!
//! The only code paths allowed to write the session store. A
//! successful login persists the portal's view of the user; a failed
//! one leaves the store untouched.

use disha_core::error::Result;
use disha_core::session::{Identity, Role, Session};
use disha_infrastructure::SessionStore;

use crate::api::{PortalApi, UserProfile};

/// Ties the login endpoints to the durable session store.
pub struct AuthFlow {
    api: PortalApi,
    store: SessionStore,
}

impl AuthFlow {
    pub fn new(api: PortalApi, store: SessionStore) -> Self {
        Self { api, store }
    }

    /// Authenticates and persists the resulting session.
    ///
    /// With `remember` set, the email is stored for the role's login
    /// form; otherwise any previously remembered email for that role
    /// is forgotten, matching the portal's remember-me checkbox.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        role: Role,
        remember: bool,
    ) -> Result<UserProfile> {
        let profile = self.api.login(email, password, role).await?;

        // Trust the role the portal confirmed, not the one requested.
        let session = Session::signed_in(profile.role, identity_of(&profile));
        self.store.set(session)?;

        let remembered = remember.then(|| email.to_string());
        self.store.set_remembered_email(role, remembered)?;

        tracing::debug!("[AuthFlow] signed in as {} ({})", email, profile.role.as_str());
        Ok(profile)
    }

    /// Clears the session. Preferences survive.
    pub fn sign_out(&self) -> Result<()> {
        tracing::debug!("[AuthFlow] signing out");
        self.store.clear()
    }
}

fn identity_of(profile: &UserProfile) -> Identity {
    Identity {
        display_name: profile
            .full_name
            .clone()
            .unwrap_or_else(|| profile.email.clone()),
        department: profile.department.clone().unwrap_or_default(),
        id: profile.email.clone(),
    }
}
