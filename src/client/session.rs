//! Client session cache: "am I logged in" as seen by the pages.
//!
//! Presence of a token is the whole check. Nothing here verifies signatures or
//! expiry; the server's session guard is the only security boundary.

use std::sync::Arc;

use super::local_store::{keys, write_json, LocalStore, LocalStoreError};
use super::records::UserProfile;
use crate::identity::{check_role, Principal, PublicUser, Role};
use crate::tprintln;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Entry,
    Dashboard,
    Admin,
    Complaint,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stay,
    Redirect(Page),
}

#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn LocalStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self { Self { store } }

    pub fn store(&self) -> &Arc<dyn LocalStore> { &self.store }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get_item(keys::AUTH_TOKEN).filter(|t| !t.is_empty())
    }

    /// Cached role. Anything other than a known role string reads as `None`.
    pub fn role(&self) -> Option<Role> {
        self.store.get_item(keys::ROLE).and_then(|r| r.parse().ok())
    }

    /// Record a successful login. `identity`, when known, seeds the profile the
    /// pages prefill from; a profile already on this device is left alone.
    pub fn login(&self, identity: Option<&PublicUser>, token: &str, role: Role) -> Result<(), LocalStoreError> {
        self.store.set_item(keys::AUTH_TOKEN, token)?;
        self.store.set_item(keys::ROLE, role.as_str())?;
        let has_profile = self.store.get_item(keys::USER_DATA).is_some();
        if let (Some(user), false) = (identity, has_profile) {
            let profile = UserProfile { name: user.name.clone(), email: user.email.clone(), ..Default::default() };
            write_json(self.store.as_ref(), keys::USER_DATA, &profile)?;
        }
        tprintln!("session.login role={}", role);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), LocalStoreError> {
        self.store.remove_item(keys::AUTH_TOKEN)?;
        self.store.remove_item(keys::ROLE)?;
        Ok(())
    }

    /// Where a logged-in user belongs, branching only on the cached role.
    pub fn home(&self) -> Page {
        match self.role() {
            Some(Role::Admin) => Page::Admin,
            _ => Page::Dashboard,
        }
    }

    /// The page-load gate. Logged-out visitors are sent to the entry page;
    /// logged-in visitors on the entry page are sent home; the admin page also
    /// needs the cached admin role.
    pub fn landing(&self, page: Page) -> Route {
        if !self.is_authenticated() {
            return if page == Page::Entry { Route::Stay } else { Route::Redirect(Page::Entry) };
        }
        match page {
            Page::Entry => Route::Redirect(self.home()),
            Page::Admin => {
                let cached = Principal { user_id: String::new(), role: self.role().unwrap_or_default() };
                match check_role(&cached, Some(Role::Admin)) {
                    Ok(()) => Route::Stay,
                    Err(_) => Route::Redirect(Page::Dashboard),
                }
            }
            _ => Route::Stay,
        }
    }
}
