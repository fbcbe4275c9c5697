//! Offline login/signup used by the demo pages.
//!
//! Contacts no server and checks nothing: after a fixed delay it writes a fake
//! token and the role picked on the form into the session cache. It exists to
//! show loading states and must never be treated as authentication.

use std::time::Duration;

use super::local_store::LocalStoreError;
use super::session::{Page, SessionCache};
use crate::identity::Role;

pub const MOCK_TOKEN: &str = "dummy-token-123";
pub const MOCK_DELAY: Duration = Duration::from_millis(1500);

pub struct MockAuthClient {
    cache: SessionCache,
    delay: Duration,
}

impl MockAuthClient {
    pub fn new(cache: SessionCache) -> Self { Self { cache, delay: MOCK_DELAY } }

    pub fn with_delay(cache: SessionCache, delay: Duration) -> Self { Self { cache, delay } }

    /// Credentials are accepted as-is. Returns the page to navigate to.
    pub async fn login(&self, _email: &str, _password: &str, selected_role: Role) -> Result<Page, LocalStoreError> {
        self.complete(selected_role).await
    }

    pub async fn signup(&self, _name: &str, _email: &str, _password: &str, selected_role: Role) -> Result<Page, LocalStoreError> {
        self.complete(selected_role).await
    }

    // Once started the delay runs to completion; dropping the future is the only way out.
    async fn complete(&self, role: Role) -> Result<Page, LocalStoreError> {
        tokio::time::sleep(self.delay).await;
        self.cache.login(None, MOCK_TOKEN, role)?;
        Ok(self.cache.home())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::local_store::MemoryLocalStore;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn writes_fake_token_after_delay() {
        let cache = SessionCache::new(Arc::new(MemoryLocalStore::new()));
        let mock = MockAuthClient::new(cache.clone());

        let started = tokio::time::Instant::now();
        let page = mock.login("anyone@x.com", "whatever", Role::User).await.unwrap();
        assert!(started.elapsed() >= MOCK_DELAY);
        assert_eq!(page, Page::Dashboard);
        assert_eq!(cache.token().as_deref(), Some(MOCK_TOKEN));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_stored_before_the_delay_elapses() {
        let cache = SessionCache::new(Arc::new(MemoryLocalStore::new()));
        let mock = MockAuthClient::new(cache.clone());
        let pending = tokio::time::timeout(Duration::from_millis(1000), mock.signup("A", "a@x.com", "pw", Role::Admin)).await;
        assert!(pending.is_err());
        assert!(!cache.is_authenticated());

        let page = mock.signup("A", "a@x.com", "pw", Role::Admin).await.unwrap();
        assert_eq!(page, Page::Admin);
    }
}
