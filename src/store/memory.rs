//! In-process store with the same unique, foreign key and cascade rules as the SQL schema.

use super::{constraints, Store};
use crate::error::StoreError;
use crate::model::{
    Course, NewCourse, NewProject, NewUser, Project, ProjectChanges, ProjectWithOwner, User,
    UserChanges, UserWithProjects,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    projects: BTreeMap<i64, Project>,
    courses: BTreeMap<i64, Course>,
    next_user: i64,
    next_project: i64,
    next_course: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    /// Unique checks for `candidate`, ignoring the row being replaced.
    fn check_user_unique(&self, candidate: &User) -> Result<(), StoreError> {
        for u in self.users.values().filter(|u| u.id != candidate.id) {
            if u.email == candidate.email {
                return Err(StoreError::UniqueViolation(constraints::USERS_EMAIL.into()));
            }
            if u.student_id == candidate.student_id {
                return Err(StoreError::UniqueViolation(constraints::USERS_STUDENT_ID.into()));
            }
        }
        Ok(())
    }

    fn check_owner(&self, owner_id: i64) -> Result<(), StoreError> {
        if self.users.contains_key(&owner_id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(constraints::PROJECTS_OWNER.into()))
        }
    }

    fn projects_of(&self, owner_id: i64) -> Vec<Project> {
        self.projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables().users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn get_user_with_projects(&self, id: i64) -> Result<Option<UserWithProjects>, StoreError> {
        let t = self.tables();
        Ok(t.users.get(&id).map(|u| UserWithProjects {
            user: u.clone(),
            projects: t.projects_of(id),
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut t = self.tables();
        let mut row = User {
            id: 0,
            student_id: user.student_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        };
        t.check_user_unique(&row)?;
        row.id = next_id(&mut t.next_user);
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn replace_user(&self, id: i64, user: &NewUser) -> Result<Option<User>, StoreError> {
        let mut t = self.tables();
        if !t.users.contains_key(&id) {
            return Ok(None);
        }
        let row = User {
            id,
            student_id: user.student_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        };
        t.check_user_unique(&row)?;
        t.users.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn patch_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, StoreError> {
        let mut t = self.tables();
        let Some(mut row) = t.users.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut row);
        t.check_user_unique(&row)?;
        t.users.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables();
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.projects.retain(|_, p| p.owner_id != id);
        Ok(true)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.tables().projects.values().cloned().collect())
    }

    async fn list_projects_for_owner(&self, owner_id: i64) -> Result<Vec<Project>, StoreError> {
        Ok(self.tables().projects_of(owner_id))
    }

    async fn get_project_with_owner(&self, id: i64) -> Result<Option<ProjectWithOwner>, StoreError> {
        let t = self.tables();
        let Some(project) = t.projects.get(&id) else {
            return Ok(None);
        };
        Ok(t.users.get(&project.owner_id).map(|owner| ProjectWithOwner {
            project: project.clone(),
            owner: owner.clone(),
        }))
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, StoreError> {
        let mut t = self.tables();
        t.check_owner(project.owner_id)?;
        let row = Project {
            id: next_id(&mut t.next_project),
            name: project.name.clone(),
            description: project.description.clone(),
            owner_id: project.owner_id,
        };
        t.projects.insert(row.id, row.clone());
        Ok(row)
    }

    async fn replace_project(&self, id: i64, project: &NewProject) -> Result<Option<Project>, StoreError> {
        let mut t = self.tables();
        if !t.projects.contains_key(&id) {
            return Ok(None);
        }
        t.check_owner(project.owner_id)?;
        let row = Project {
            id,
            name: project.name.clone(),
            description: project.description.clone(),
            owner_id: project.owner_id,
        };
        t.projects.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn patch_project(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>, StoreError> {
        let mut t = self.tables();
        Ok(t.projects.get_mut(&id).map(|row| {
            changes.apply(row);
            row.clone()
        }))
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course, StoreError> {
        let mut t = self.tables();
        if t.courses.values().any(|c| c.code == course.code) {
            return Err(StoreError::UniqueViolation(constraints::COURSES_CODE.into()));
        }
        let row = Course {
            id: next_id(&mut t.next_course),
            code: course.code.clone(),
            name: course.name.clone(),
            credits: course.credits,
        };
        t.courses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_courses(&self, limit: u32, offset: u32) -> Result<Vec<Course>, StoreError> {
        Ok(self
            .tables()
            .courses
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(n: u32) -> NewUser {
        NewUser {
            student_id: format!("S{:07}", n),
            name: format!("Student {n}"),
            email: format!("s{n}@uni.edu"),
            age: 20,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_not_stored() {
        let store = MemoryStore::new();
        store.create_user(&new_user(1)).await.unwrap();
        let mut dup = new_user(2);
        dup.email = "s1@uni.edu".into();
        match store.create_user(&dup).await {
            Err(StoreError::UniqueViolation(c)) => assert_eq!(c, constraints::USERS_EMAIL),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_may_keep_own_unique_values() {
        let store = MemoryStore::new();
        let u = store.create_user(&new_user(1)).await.unwrap();
        let mut same = new_user(1);
        same.name = "Renamed".into();
        let r = store.replace_user(u.id, &same).await.unwrap().unwrap();
        assert_eq!(r.name, "Renamed");
    }

    #[tokio::test]
    async fn patch_conflict_leaves_row_untouched() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user(1)).await.unwrap();
        store.create_user(&new_user(2)).await.unwrap();
        let changes = UserChanges {
            student_id: Some("S0000002".into()),
            name: Some("Changed".into()),
            ..Default::default()
        };
        assert!(store.patch_user(a.id, &changes).await.is_err());
        assert_eq!(store.get_user(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn delete_cascades_to_projects() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user(1)).await.unwrap();
        let b = store.create_user(&new_user(2)).await.unwrap();
        for owner in [a.id, a.id, b.id] {
            store
                .create_project(&NewProject { name: "p".into(), description: None, owner_id: owner })
                .await
                .unwrap();
        }
        assert!(store.delete_user(a.id).await.unwrap());
        let left = store.list_projects().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].owner_id, b.id);
        assert!(!store.delete_user(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn project_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .create_project(&NewProject { name: "p".into(), description: None, owner_id: 42 })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn courses_page_by_id() {
        let store = MemoryStore::new();
        for code in ["A1", "B2", "C3"] {
            store
                .create_course(&NewCourse { code: code.into(), name: "n".into(), credits: 3 })
                .await
                .unwrap();
        }
        let page = store.list_courses(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].code, "B2");
        assert!(store.list_courses(10, 5).await.unwrap().is_empty());
    }
}
