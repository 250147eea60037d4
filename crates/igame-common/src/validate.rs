//! Client-side input checks run before a request is sent.

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const NUMBER_MIN: u8 = 1;
pub const NUMBER_MAX: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Input cannot be empty")]
    Empty,

    #[error("Input must be at least 3 characters long")]
    TooShort,

    #[error("Input cannot be longer than 20 characters")]
    TooLong,

    #[error("Please enter a valid number between 1 and 9")]
    NumberOutOfRange,
}

/// Check a login name. Length is counted in characters, untrimmed.
pub fn validate_username(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = input.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > USERNAME_MAX_LEN {
        return Err(ValidationError::TooLong);
    }
    Ok(())
}

/// Parse and range-check a lucky number typed by the player.
pub fn validate_chosen_number(input: &str) -> Result<u8, ValidationError> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|n| (NUMBER_MIN..=NUMBER_MAX).contains(n))
        .ok_or(ValidationError::NumberOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert_eq!(validate_username(""), Err(ValidationError::Empty));
        assert_eq!(validate_username("   "), Err(ValidationError::Empty));
        assert_eq!(validate_username("ab"), Err(ValidationError::TooShort));
        assert_eq!(
            validate_username("abcdefghijklmnopqrstu"),
            Err(ValidationError::TooLong)
        );
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("abcdefghijklmnopqrst").is_ok());
    }

    #[test]
    fn username_length_counts_characters() {
        assert!(validate_username("ñandú").is_ok());
    }

    #[test]
    fn chosen_number_rules() {
        assert_eq!(validate_chosen_number("5"), Ok(5));
        assert_eq!(validate_chosen_number(" 9 "), Ok(9));
        assert_eq!(
            validate_chosen_number("0"),
            Err(ValidationError::NumberOutOfRange)
        );
        assert_eq!(
            validate_chosen_number("10"),
            Err(ValidationError::NumberOutOfRange)
        );
        assert_eq!(
            validate_chosen_number("seven"),
            Err(ValidationError::NumberOutOfRange)
        );
        assert_eq!(
            validate_chosen_number(""),
            Err(ValidationError::NumberOutOfRange)
        );
    }
}
