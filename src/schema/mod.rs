//! Request schemas and field rules. Every payload is checked before it reaches the store.

mod course;
mod project;
mod user;

pub use course::{CourseCreate, CourseListQuery, DEFAULT_COURSE_LIMIT};
pub use project::{ProjectCreate, ProjectCreateForUser, ProjectUpdate};
pub use user::{UserCreate, UserQuery, UserUpdate};

use crate::error::{AppError, FieldError};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;

/// A payload that can report every violated field at once.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Field of a partial update: omitted, explicitly `null`, or a value.
/// Pair with `#[serde(default)]` so omitted fields stay [`Patch::Absent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    /// The supplied value, if any. `Null` and `Absent` both yield `None`.
    pub fn value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    /// For nullable columns: `None` when omitted, `Some(None)` when cleared.
    pub fn into_nullable(self) -> Option<Option<T>> {
        match self {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles"))
}

fn student_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^S[0-9]{7}$").expect("student id pattern compiles"))
}

/// Accumulates field errors; string lengths count characters, not bytes.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let n = value.chars().count();
        if n < min {
            self.fail(field, format!("must be at least {} characters", min));
        } else if n > max {
            self.fail(field, format!("must be at most {} characters", max));
        }
        self
    }

    pub fn student_id(&mut self, field: &str, value: &str) -> &mut Self {
        if !student_id_regex().is_match(value) {
            self.fail(field, "must be 'S' followed by 7 digits");
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !email_regex().is_match(value) {
            self.fail(field, "must be a valid email address");
        }
        self
    }

    pub fn greater_than(&mut self, field: &str, value: i64, bound: i64) -> &mut Self {
        if value <= bound {
            self.fail(field, format!("must be greater than {}", bound));
        }
        self
    }

    pub fn between(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min {
            self.fail(field, format!("must be at least {}", min));
        } else if value > max {
            self.fail(field, format!("must be at most {}", max));
        }
        self
    }

    /// Reject an explicit `null` on a column that cannot hold one.
    pub fn not_null<T>(&mut self, field: &str, value: &Patch<T>) -> &mut Self {
        if matches!(value, Patch::Null) {
            self.fail(field, "may not be null");
        }
        self
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default)]
        name: Patch<String>,
    }

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        let s: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(s.name, Patch::Absent);
        let s: Sample = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(s.name, Patch::Null);
        let s: Sample = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(s.name, Patch::Value("x".to_string()));
    }

    #[test]
    fn nullable_conversion() {
        assert_eq!(Patch::<i32>::Absent.into_nullable(), None);
        assert_eq!(Patch::<i32>::Null.into_nullable(), Some(None));
        assert_eq!(Patch::Value(3).into_nullable(), Some(Some(3)));
    }

    #[test]
    fn lengths_count_characters() {
        let mut c = Checks::new();
        c.length("name", "éé", 2, 2);
        assert!(c.finish().is_ok());
        c.length("name", "a", 2, 50).length("code", "", 1, 32);
        match c.finish() {
            Err(AppError::Validation(errs)) => {
                let fields: Vec<_> = errs.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["name", "code"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn student_id_pattern() {
        for ok in ["S1234567", "S0000000"] {
            assert!(Checks::new().student_id("student_id", ok).finish().is_ok(), "{ok}");
        }
        for bad in ["S123", "s1234567", "S12345678", "X1234567", "S12345a7", ""] {
            assert!(Checks::new().student_id("student_id", bad).finish().is_err(), "{bad}");
        }
    }

    #[test]
    fn email_format() {
        assert!(Checks::new().email("email", "ada@example.com").finish().is_ok());
        for bad in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com"] {
            assert!(Checks::new().email("email", bad).finish().is_err(), "{bad}");
        }
    }

    #[test]
    fn numeric_bounds() {
        assert!(Checks::new().greater_than("age", 18, 18).finish().is_err());
        assert!(Checks::new().greater_than("age", 19, 18).finish().is_ok());
        assert!(Checks::new().between("credits", 0, 1, 120).finish().is_err());
        assert!(Checks::new().between("credits", 121, 1, 120).finish().is_err());
        assert!(Checks::new().between("credits", 120, 1, 120).finish().is_ok());
    }
}
