//! Central identity and session management: who a caller is and what they may do.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod store;
mod clock;
mod token;
mod provider;
mod authorizer;
mod guard;

pub use principal::{Principal, PublicUser, Role, User};
pub use store::{CredentialStore, MemoryCredentialStore, StoreError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{Claims, IssuedToken, TokenError, TokenSigner, TOKEN_TTL};
pub use provider::{Authenticator, LoginRequest, LoginResponse, RegisterRequest, RolePolicy};
pub use authorizer::check_role;
pub use guard::{AUTH_HEADER, Authenticated, RequireAdmin, SessionGuard};
