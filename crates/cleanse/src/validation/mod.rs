//! Field validation: blank records, email format, phone format.

mod engine;
mod validators;
mod verdict;

pub use engine::{StageOutcome, ValidationConfig, ValidationEngine};
pub use validators::{
    BlankRecordValidator, EMAIL_PATTERN, EmailValidator, FieldValidator, NULL_PHONE_PLACEHOLDER,
    PHONE_SEPARATORS, PhoneValidator,
};
pub use verdict::{FieldError, RowError, StageFailure, Verdict};
