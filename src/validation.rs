use crate::error::ApiError;

/// Trimmed, lowercased email used as the uniqueness key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trimmed value, or `None` when absent or blank.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Collects presence failures so a request reports every missing field at once.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        optional(value).unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    /// Like [`RequiredFields::text`] but keeps the value untouched.
    pub fn secret(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    pub fn check(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM \n"), "jane.doe@example.com");
    }

    #[test]
    fn optional_drops_blank_values() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(None), None);
        assert_eq!(optional(Some(" male ".into())), Some("male".into()));
    }

    #[test]
    fn reports_every_missing_field() {
        let mut required = RequiredFields::new();
        let name = required.text("name", Some(" Ann ".into()));
        required.text("email", Some("   ".into()));
        required.secret("password", None);
        assert_eq!(name, "Ann");

        match required.check() {
            Err(ApiError::Validation(msg)) => {
                assert_eq!(msg, "Missing required fields: email, password")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn secret_is_not_trimmed() {
        let mut required = RequiredFields::new();
        let pw = required.secret("password", Some(" pw 123 ".into()));
        assert_eq!(pw, " pw 123 ");
        assert!(required.check().is_ok());
    }
}
