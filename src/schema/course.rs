use super::{Checks, Validate};
use crate::error::AppError;
use crate::model::NewCourse;
use serde::Deserialize;

pub const DEFAULT_COURSE_LIMIT: u32 = 10;

#[derive(Clone, Debug, Deserialize)]
pub struct CourseCreate {
    pub code: String,
    pub name: String,
    pub credits: i32,
}

impl Validate for CourseCreate {
    fn validate(&self) -> Result<(), AppError> {
        Checks::new()
            .length("code", &self.code, 1, 32)
            .length("name", &self.name, 1, 255)
            .between("credits", self.credits.into(), 1, 120)
            .finish()
    }
}

impl From<CourseCreate> for NewCourse {
    fn from(p: CourseCreate) -> Self {
        NewCourse {
            code: p.code,
            name: p.name,
            credits: p.credits,
        }
    }
}

/// `?limit=&offset=` for the course listing.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct CourseListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CourseListQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_COURSE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credits_bounds() {
        for (credits, ok) in [(0, false), (1, true), (120, true), (121, false)] {
            let c: CourseCreate =
                serde_json::from_value(json!({ "code": "CS101", "name": "Intro", "credits": credits })).unwrap();
            assert_eq!(c.validate().is_ok(), ok, "credits={credits}");
        }
    }

    #[test]
    fn code_length() {
        let c: CourseCreate =
            serde_json::from_value(json!({ "code": "C".repeat(33), "name": "Intro", "credits": 5 })).unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn listing_defaults() {
        let q = CourseListQuery::default();
        assert_eq!((q.limit(), q.offset()), (10, 0));
    }
}
