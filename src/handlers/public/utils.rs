// Input validation shared by the account handlers

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Validate username format, returning the normalized (lowercase) form
pub fn validate_username_format(username: &str) -> Result<String, String> {
    let username = username.trim();

    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    if username.chars().count() < USERNAME_MIN_LEN {
        return Err(format!("Username must be at least {} characters", USERNAME_MIN_LEN));
    }

    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!("Username must be at most {} characters", USERNAME_MAX_LEN));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Username can only contain letters, numbers, and underscore".to_string());
    }

    Ok(username.to_lowercase())
}

/// Basic email format check: one `@`, non-empty local part, dotted domain
pub fn validate_email_format(email: &str) -> Result<String, String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    Ok(email.to_lowercase())
}

/// Password strength: length bounds plus upper, lower and digit
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(format!("Password must be at least {} characters", PASSWORD_MIN_LEN));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(format!("Password must be at most {} characters", PASSWORD_MAX_LEN));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }
    Ok(())
}
