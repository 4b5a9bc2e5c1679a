// Validation utilities module
// Custom field validators used by request DTOs

use validator::ValidationError;

/// Usernames are stored verbatim, so reject leading, trailing or embedded whitespace
/// and control characters
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Err(ValidationError::new("username_contains_whitespace"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice_01.admin").is_ok());
        assert!(validate_username(" alice").is_err());
        assert!(validate_username("al\tice").is_err());
    }
}
