use super::{Checks, Patch, Validate};
use crate::error::AppError;
use crate::model::{NewProject, ProjectChanges};
use serde::Deserialize;

const NAME_MIN: usize = 1;
const NAME_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 2000;

fn check_description(c: &mut Checks, description: Option<&String>) {
    if let Some(d) = description {
        c.length("description", d, 0, DESCRIPTION_MAX);
    }
}

/// Flat create (`owner_id` in the body); also the full-replace payload.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: i64,
}

impl Validate for ProjectCreate {
    fn validate(&self) -> Result<(), AppError> {
        let mut c = Checks::new();
        c.length("name", &self.name, NAME_MIN, NAME_MAX);
        check_description(&mut c, self.description.as_ref());
        c.finish()
    }
}

impl From<ProjectCreate> for NewProject {
    fn from(p: ProjectCreate) -> Self {
        NewProject {
            name: p.name,
            description: p.description,
            owner_id: p.owner_id,
        }
    }
}

/// Nested create under `/api/users/{id}/projects`; the owner comes from the path.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectCreateForUser {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for ProjectCreateForUser {
    fn validate(&self) -> Result<(), AppError> {
        let mut c = Checks::new();
        c.length("name", &self.name, NAME_MIN, NAME_MAX);
        check_description(&mut c, self.description.as_ref());
        c.finish()
    }
}

impl ProjectCreateForUser {
    pub fn owned_by(self, owner_id: i64) -> NewProject {
        NewProject {
            name: self.name,
            description: self.description,
            owner_id,
        }
    }
}

/// Partial update. `description: null` clears the description.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

impl Validate for ProjectUpdate {
    fn validate(&self) -> Result<(), AppError> {
        let mut c = Checks::new();
        c.not_null("name", &self.name);
        if let Patch::Value(v) = &self.name {
            c.length("name", v, NAME_MIN, NAME_MAX);
        }
        if let Patch::Value(v) = &self.description {
            check_description(&mut c, Some(v));
        }
        c.finish()
    }
}

impl From<ProjectUpdate> for ProjectChanges {
    fn from(p: ProjectUpdate) -> Self {
        ProjectChanges {
            name: p.name.value(),
            description: p.description.into_nullable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_is_optional_and_bounded() {
        let p: ProjectCreate = serde_json::from_value(json!({ "name": "Thesis", "owner_id": 1 })).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.description, None);

        let long = "x".repeat(DESCRIPTION_MAX + 1);
        let p: ProjectCreate =
            serde_json::from_value(json!({ "name": "Thesis", "description": long, "owner_id": 1 })).unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn empty_name_rejected() {
        let p: ProjectCreateForUser = serde_json::from_value(json!({ "name": "" })).unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let p: ProjectUpdate = serde_json::from_value(json!({ "description": "v2" })).unwrap();
        assert!(p.validate().is_ok());
        let ch = ProjectChanges::from(p);
        assert_eq!(ch.name, None);
        assert_eq!(ch.description, Some(Some("v2".to_string())));
    }

    #[test]
    fn update_null_description_clears_but_null_name_fails() {
        let p: ProjectUpdate = serde_json::from_value(json!({ "description": null })).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(ProjectChanges::from(p).description, Some(None));

        let p: ProjectUpdate = serde_json::from_value(json!({ "name": null })).unwrap();
        assert!(p.validate().is_err());
    }
}
