//! Form validation for credentials and event payloads
//!
//! These checks run before anything is sent so that obviously bad input
//! never reaches the API.

use crate::types::{EventDraft, EventPatch};
use chrono::NaiveDate;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords must match")]
    PasswordMismatch,

    #[error("Name is required")]
    NameRequired,

    #[error("{0} is required")]
    FieldRequired(&'static str),

    #[error("End date {end} is before start date {start}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("Nothing to update")]
    EmptyUpdate,
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    // Domain needs at least one dot with a label on each side
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate login form input
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_password(password)
}

/// Validate signup form input
pub fn validate_signup(
    email: &str,
    name: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    validate_password(password)?;
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::DateRange { start, end });
    }
    Ok(())
}

impl EventDraft {
    /// Check required fields and date order
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::FieldRequired("Title"));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::FieldRequired("Location"));
        }
        validate_date_range(self.start_date, self.end_date)
    }
}

impl EventPatch {
    /// Check the fields the patch sets. Date order can only be checked
    /// when both dates are part of the patch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::FieldRequired("Title"));
        }
        if self.location.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(ValidationError::FieldRequired("Location"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            validate_date_range(start, end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_ordinary_emails() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email(" first.last@events.co.uk ").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("   "), Err(ValidationError::EmailRequired));
        for bad in ["plain", "@example.com", "a@b", "a@@b.com", "a@b..com", "a b@c.com", "a@.com"] {
            assert_eq!(validate_email(bad), Err(ValidationError::InvalidEmail), "{bad}");
        }
    }

    #[test]
    fn password_length_is_enforced() {
        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(validate_password("12345"), Err(ValidationError::PasswordTooShort));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn signup_requires_matching_passwords_and_name() {
        assert_eq!(
            validate_signup("a@b.com", "", "secret1", "secret1"),
            Err(ValidationError::NameRequired)
        );
        assert_eq!(
            validate_signup("a@b.com", "Ada", "secret1", "secret2"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(validate_signup("a@b.com", "Ada", "secret1", "secret1").is_ok());
    }

    #[test]
    fn draft_requires_title_location_and_ordered_dates() {
        let ok = EventDraft::new("Launch", "Hall A", date(2025, 3, 1), date(2025, 3, 1));
        assert!(ok.validate().is_ok());

        let untitled = EventDraft::new(" ", "Hall A", date(2025, 3, 1), date(2025, 3, 2));
        assert_eq!(untitled.validate(), Err(ValidationError::FieldRequired("Title")));

        let backwards = EventDraft::new("Launch", "Hall A", date(2025, 3, 2), date(2025, 3, 1));
        assert!(matches!(backwards.validate(), Err(ValidationError::DateRange { .. })));
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert_eq!(
            EventPatch::default().validate(),
            Err(ValidationError::EmptyUpdate)
        );

        let blank_location = EventPatch {
            location: Some(String::new()),
            ..EventPatch::default()
        };
        assert_eq!(
            blank_location.validate(),
            Err(ValidationError::FieldRequired("Location"))
        );

        let single_date = EventPatch {
            end_date: Some(date(2020, 1, 1)),
            ..EventPatch::default()
        };
        assert!(single_date.validate().is_ok());
    }

    #[test]
    fn error_messages_match_form_copy() {
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(ValidationError::InvalidEmail.to_string(), "Invalid email format");
    }
}
