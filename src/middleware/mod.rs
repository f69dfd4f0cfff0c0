pub mod auth;
pub mod interceptors;
pub mod rate_limit;
pub mod response;

pub use auth::jwt_auth_middleware;
pub use interceptors::{Interceptor, DEFAULT_CHAIN};
pub use rate_limit::rate_limit_middleware;
pub use response::{ApiResponse, ApiResult};
