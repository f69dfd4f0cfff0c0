pub mod error;
pub mod password;
pub mod policy;
pub mod rate_limit;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use password::{CredentialVerifier, PasswordError};
pub use policy::{authorize_resource, can_access, require_admin, Decision};
pub use rate_limit::RateLimiter;
pub use service::{authenticate, resolve_bearer};
pub use token::{Claims, TokenError, TokenService};
