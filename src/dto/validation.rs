//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::lobby::LOBBY_CODE_LENGTH;

/// Validates that a lobby code is exactly 6 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_lobby_code("AB12CD") // Ok
/// validate_lobby_code("ab12cd") // Err - lowercase
/// validate_lobby_code("AB12C")  // Err - too short
/// ```
pub fn validate_lobby_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != LOBBY_CODE_LENGTH {
        let mut err = ValidationError::new("lobby_code_length");
        err.message = Some(
            format!(
                "Lobby code must be exactly {} characters (got {})",
                LOBBY_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("lobby_code_format");
        err.message = Some("Lobby code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lobby_code_valid() {
        assert!(validate_lobby_code("AB12CD").is_ok());
        assert!(validate_lobby_code("ZZZZZZ").is_ok());
        assert!(validate_lobby_code("000000").is_ok());
    }

    #[test]
    fn test_validate_lobby_code_invalid_length() {
        assert!(validate_lobby_code("AB12C").is_err()); // too short
        assert!(validate_lobby_code("AB12CDE").is_err()); // too long
        assert!(validate_lobby_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_lobby_code_invalid_format() {
        assert!(validate_lobby_code("ab12cd").is_err()); // lowercase
        assert!(validate_lobby_code("AB12C!").is_err()); // punctuation
        assert!(validate_lobby_code("AB 2CD").is_err()); // space
    }
}
