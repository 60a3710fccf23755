//! Field validators that partition records into valid and quarantined.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::{Record, Value};
use crate::quarantine::RejectionReason;

use super::verdict::{FieldError, Verdict};

/// Basic address shape: local part, `@`, domain, dot, 2+ letter TLD.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

/// Characters stripped from phone numbers before the digit check.
pub const PHONE_SEPARATORS: &[char] = &['+', '(', ')', '-', '.', ' '];

/// How a null phone renders before stripping, so it always fails the digit check.
pub const NULL_PHONE_PLACEHOLDER: &str = "nan";

/// Trait for field validators.
///
/// A validator looks at one record at a time and never sees the rest of the
/// dataset, so rows can be checked in any order and in parallel.
pub trait FieldValidator: Send + Sync {
    /// Stage name used in logs, reports and the quarantine file.
    fn name(&self) -> &'static str;

    /// Reason attached to the records this validator rejects.
    fn reason(&self) -> RejectionReason;

    /// Column this validator inspects, if it targets a single column.
    fn column(&self) -> Option<&str> {
        None
    }

    /// Check one record. `field` is the resolved position of [`Self::column`].
    fn check(&self, record: &Record, field: Option<usize>) -> Result<Verdict, FieldError>;
}

/// Look up the target field of a column validator.
fn target<'a>(
    validator: &'static str,
    record: &'a Record,
    field: Option<usize>,
) -> Result<(usize, &'a Value), FieldError> {
    let field = field.ok_or(FieldError::Unbound { validator })?;
    let value = record.get(field).ok_or(FieldError::MissingField {
        line: record.line(),
        field,
    })?;
    Ok((field, value))
}

/// Rejects records where every field is null.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRecordValidator;

impl FieldValidator for BlankRecordValidator {
    fn name(&self) -> &'static str {
        "blank_record_validator"
    }

    fn reason(&self) -> RejectionReason {
        RejectionReason::Blank
    }

    fn check(&self, record: &Record, _field: Option<usize>) -> Result<Verdict, FieldError> {
        if record.is_blank() {
            Ok(Verdict::reject("all fields are empty"))
        } else {
            Ok(Verdict::Pass)
        }
    }
}

/// Rejects records whose email does not look like an address.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    column: String,
}

impl EmailValidator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Check a single value. Null never matches.
    pub fn is_valid(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Text(s) => EMAIL_REGEX.is_match(s),
            other => EMAIL_REGEX.is_match(&other.to_string()),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new("email")
    }
}

impl FieldValidator for EmailValidator {
    fn name(&self) -> &'static str {
        "email_validator"
    }

    fn reason(&self) -> RejectionReason {
        RejectionReason::BadEmail
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn check(&self, record: &Record, field: Option<usize>) -> Result<Verdict, FieldError> {
        let (_, value) = target(self.name(), record, field)?;
        if Self::is_valid(value) {
            Ok(Verdict::Pass)
        } else if value.is_null() {
            Ok(Verdict::reject(format!("{} is missing", self.column)))
        } else {
            Ok(Verdict::reject(format!("'{}' is not a valid email", value)))
        }
    }
}

/// Rejects unusable phone numbers and strips separators from the rest.
#[derive(Debug, Clone)]
pub struct PhoneValidator {
    column: String,
}

impl PhoneValidator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Digits of a phone value, or `None` if it is not a phone number.
    pub fn normalize(value: &Value) -> Option<String> {
        let rendered = match value {
            Value::Null => NULL_PHONE_PLACEHOLDER.to_string(),
            other => other.to_string(),
        };
        let digits = rendered.replace(PHONE_SEPARATORS, "");
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(digits)
        } else {
            None
        }
    }
}

impl Default for PhoneValidator {
    fn default() -> Self {
        Self::new("phone")
    }
}

impl FieldValidator for PhoneValidator {
    fn name(&self) -> &'static str {
        "phone_validator"
    }

    fn reason(&self) -> RejectionReason {
        RejectionReason::BadPhone
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn check(&self, record: &Record, field: Option<usize>) -> Result<Verdict, FieldError> {
        let (field, value) = target(self.name(), record, field)?;
        match Self::normalize(value) {
            Some(digits) if value.as_str() == Some(digits.as_str()) => Ok(Verdict::Pass),
            Some(digits) => Ok(Verdict::Rewrite {
                field,
                value: Value::Text(digits),
            }),
            None if value.is_null() => Ok(Verdict::reject(format!("{} is missing", self.column))),
            None => Ok(Verdict::reject(format!("'{}' is not a phone number", value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(values: Vec<Value>) -> Record {
        Record::new(2, values)
    }

    #[test]
    fn test_blank_record() {
        let validator = BlankRecordValidator;
        let blank = record(vec![Value::Null, Value::Null, Value::Null]);
        let partial = record(vec![Value::Null, Value::from("x"), Value::Null]);

        assert!(validator.check(&blank, None).unwrap().is_reject());
        assert_eq!(validator.check(&partial, None).unwrap(), Verdict::Pass);
    }

    #[test]
    fn test_email_examples() {
        assert!(EmailValidator::is_valid(&Value::from("a@b.co")));
        assert!(EmailValidator::is_valid(&Value::from("First.Last+tag@mail-host.example.org")));
        assert!(!EmailValidator::is_valid(&Value::from("a@b")));
        assert!(!EmailValidator::is_valid(&Value::from("a.b@@c.com")));
        assert!(!EmailValidator::is_valid(&Value::from("a@b.c")));
        assert!(!EmailValidator::is_valid(&Value::from(" a@b.co")));
        assert!(!EmailValidator::is_valid(&Value::Integer(5)));
        assert!(!EmailValidator::is_valid(&Value::Null));
    }

    #[test]
    fn test_email_check_uses_resolved_field() {
        let validator = EmailValidator::default();
        let good = record(vec![Value::Integer(1), Value::from("a@b.co")]);
        let bad = record(vec![Value::Integer(1), Value::from("bad")]);
        let null = record(vec![Value::Integer(1), Value::Null]);

        assert_eq!(validator.check(&good, Some(1)).unwrap(), Verdict::Pass);
        assert_eq!(
            validator.check(&bad, Some(1)).unwrap(),
            Verdict::reject("'bad' is not a valid email")
        );
        assert_eq!(
            validator.check(&null, Some(1)).unwrap(),
            Verdict::reject("email is missing")
        );
    }

    #[test]
    fn test_column_validator_errors() {
        let validator = EmailValidator::default();
        let row = record(vec![Value::from("a@b.co")]);

        assert_eq!(
            validator.check(&row, None),
            Err(FieldError::Unbound {
                validator: "email_validator"
            })
        );
        assert_eq!(
            validator.check(&row, Some(3)),
            Err(FieldError::MissingField { line: 2, field: 3 })
        );
    }

    #[test]
    fn test_phone_normalize() {
        assert_eq!(
            PhoneValidator::normalize(&Value::from("+1 (555) 123-4567")),
            Some("15551234567".to_string())
        );
        assert_eq!(
            PhoneValidator::normalize(&Value::from("555.123.4567")),
            Some("5551234567".to_string())
        );
        assert_eq!(
            PhoneValidator::normalize(&Value::from("0123")),
            Some("0123".to_string())
        );
        assert_eq!(PhoneValidator::normalize(&Value::Integer(5551234)), Some("5551234".to_string()));
        assert_eq!(PhoneValidator::normalize(&Value::from("call me")), None);
        assert_eq!(PhoneValidator::normalize(&Value::from("---")), None);
        assert_eq!(PhoneValidator::normalize(&Value::from("٣٣٣")), None);
        assert_eq!(PhoneValidator::normalize(&Value::Null), None);
    }

    #[test]
    fn test_phone_check() {
        let validator = PhoneValidator::default();

        let formatted = record(vec![Value::from("+1 (555) 123-4567")]);
        assert_eq!(
            validator.check(&formatted, Some(0)).unwrap(),
            Verdict::Rewrite {
                field: 0,
                value: Value::from("15551234567")
            }
        );

        let clean = record(vec![Value::from("0555")]);
        assert_eq!(validator.check(&clean, Some(0)).unwrap(), Verdict::Pass);

        let words = record(vec![Value::from("call me")]);
        assert_eq!(
            validator.check(&words, Some(0)).unwrap(),
            Verdict::reject("'call me' is not a phone number")
        );

        let null = record(vec![Value::Null]);
        assert_eq!(
            validator.check(&null, Some(0)).unwrap(),
            Verdict::reject("phone is missing")
        );
    }
}
