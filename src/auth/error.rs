use thiserror::Error;

/// Expected outcomes of the security layer; none of these are fatal
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Could not validate credentials")]
    TokenMalformed,

    #[error("User is inactive or no longer exists")]
    PrincipalInactiveOrMissing,

    #[error("Permission denied")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::PrincipalInactiveOrMissing => 401,
            AuthError::Forbidden => 403,
            AuthError::RateLimited => 429,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenMalformed => "TOKEN_MALFORMED",
            AuthError::PrincipalInactiveOrMissing => "PRINCIPAL_INACTIVE",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::RateLimited => "RATE_LIMITED",
        }
    }

    /// 401 outcomes, which carry a `WWW-Authenticate` challenge
    pub fn is_unauthenticated(&self) -> bool {
        self.status_code() == 401
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_one_status() {
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::TokenMalformed.status_code(), 401);
        assert_eq!(AuthError::Forbidden.status_code(), 403);
        assert_eq!(AuthError::RateLimited.status_code(), 429);
        assert!(AuthError::InvalidCredentials.is_unauthenticated());
        assert!(!AuthError::Forbidden.is_unauthenticated());
    }
}
