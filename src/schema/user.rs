use super::{Checks, Patch, Validate};
use crate::error::AppError;
use crate::model::{NewUser, UserChanges};
use serde::Deserialize;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
/// Age must exceed this on every write, partial updates included.
const AGE_FLOOR: i64 = 18;
/// Upper bound accepted by partial updates.
const UPDATE_AGE_MAX: i64 = 150;

/// Create payload, also used for full replace.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCreate {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), AppError> {
        Checks::new()
            .student_id("student_id", &self.student_id)
            .length("name", &self.name, NAME_MIN, NAME_MAX)
            .email("email", &self.email)
            .greater_than("age", self.age.into(), AGE_FLOOR)
            .finish()
    }
}

impl From<UserCreate> for NewUser {
    fn from(p: UserCreate) -> Self {
        NewUser {
            student_id: p.student_id,
            name: p.name,
            email: p.email,
            age: p.age,
        }
    }
}

/// Partial update: only supplied fields change.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub student_id: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub age: Patch<i32>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), AppError> {
        let mut c = Checks::new();
        c.not_null("student_id", &self.student_id)
            .not_null("name", &self.name)
            .not_null("email", &self.email)
            .not_null("age", &self.age);
        if let Patch::Value(v) = &self.student_id {
            c.student_id("student_id", v);
        }
        if let Patch::Value(v) = &self.name {
            c.length("name", v, NAME_MIN, NAME_MAX);
        }
        if let Patch::Value(v) = &self.email {
            c.email("email", v);
        }
        if let Patch::Value(v) = self.age {
            c.between("age", v.into(), AGE_FLOOR + 1, UPDATE_AGE_MAX);
        }
        c.finish()
    }
}

impl From<UserUpdate> for UserChanges {
    fn from(p: UserUpdate) -> Self {
        UserChanges {
            student_id: p.student_id.value(),
            name: p.name.value(),
            email: p.email.value(),
            age: p.age.value(),
        }
    }
}

/// Query string for `GET /api/users/{id}`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserQuery {
    pub include: Option<String>,
}

impl UserQuery {
    /// Whether the owned projects should be nested into the response.
    pub fn with_projects(&self) -> Result<bool, AppError> {
        match self.include.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some("projects") => Ok(true),
            Some(other) => Err(AppError::BadRequest(format!("unsupported include: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(age: i32, student_id: &str) -> UserCreate {
        serde_json::from_value(json!({
            "student_id": student_id,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "age": age,
        }))
        .unwrap()
    }

    fn failed_fields(r: Result<(), AppError>) -> Vec<String> {
        match r {
            Err(AppError::Validation(errs)) => errs.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn age_must_exceed_eighteen() {
        assert_eq!(failed_fields(create(18, "S1234567").validate()), ["age"]);
        assert!(create(19, "S1234567").validate().is_ok());
    }

    #[test]
    fn student_id_checked_on_create() {
        assert_eq!(failed_fields(create(20, "S123").validate()), ["student_id"]);
    }

    #[test]
    fn every_bad_field_reported() {
        let p: UserCreate = serde_json::from_value(json!({
            "student_id": "bad", "name": "A", "email": "nope", "age": 3
        }))
        .unwrap();
        assert_eq!(failed_fields(p.validate()), ["student_id", "name", "email", "age"]);
    }

    #[test]
    fn update_only_checks_supplied_fields() {
        let p: UserUpdate = serde_json::from_value(json!({ "name": "Grace" })).unwrap();
        assert!(p.validate().is_ok());
        let changes = UserChanges::from(p);
        assert_eq!(changes.name.as_deref(), Some("Grace"));
        assert!(changes.email.is_none() && changes.age.is_none() && changes.student_id.is_none());
    }

    #[test]
    fn update_rejects_null_and_out_of_range() {
        let p: UserUpdate = serde_json::from_value(json!({ "email": null, "age": 151 })).unwrap();
        assert_eq!(failed_fields(p.validate()), ["email", "age"]);
        let p: UserUpdate = serde_json::from_value(json!({ "age": 18 })).unwrap();
        assert_eq!(failed_fields(p.validate()), ["age"]);
        let p: UserUpdate = serde_json::from_value(json!({ "age": 19 })).unwrap();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn include_parameter() {
        assert!(!UserQuery::default().with_projects().unwrap());
        let q = UserQuery { include: Some("projects".into()) };
        assert!(q.with_projects().unwrap());
        let q = UserQuery { include: Some("courses".into()) };
        assert!(q.with_projects().is_err());
    }
}
