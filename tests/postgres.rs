//! PgStore against a live database. Ignored by default; run with
//! `DATABASE_URL=postgres://... cargo test --test postgres -- --ignored`.

use campus_api::model::{NewCourse, NewProject, NewUser, ProjectChanges, UserChanges};
use campus_api::{apply_schema, PgStore, Store, StoreError};
use sqlx::postgres::PgPoolOptions;
use std::time::{SystemTime, UNIX_EPOCH};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a PostgreSQL server");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    apply_schema(&pool).await.expect("apply schema");
    PgStore::new(pool)
}

/// Per-run suffix so repeated runs do not trip unique constraints.
fn unique() -> u32 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    nanos % 10_000_000
}

fn new_user(n: u32) -> NewUser {
    NewUser {
        student_id: format!("S{:07}", n % 10_000_000),
        name: "Pg Student".into(),
        email: format!("pg{n}@uni.edu"),
        age: 22,
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
async fn user_lifecycle_and_cascade() {
    let store = store().await;
    let n = unique();
    let user = store.create_user(&new_user(n)).await.unwrap();
    assert_eq!(store.get_user(user.id).await.unwrap().as_ref(), Some(&user));

    match store.create_user(&new_user(n)).await {
        Err(StoreError::UniqueViolation(_)) => {}
        other => panic!("expected unique violation, got {other:?}"),
    }

    let patched = store
        .patch_user(user.id, &UserChanges { age: Some(30), ..Default::default() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patched.age, 30);
    assert_eq!(patched.email, user.email);

    let project = store
        .create_project(&NewProject { name: "pg".into(), description: Some("d".into()), owner_id: user.id })
        .await
        .unwrap();
    let cleared = store
        .patch_project(project.id, &ProjectChanges { name: None, description: Some(None) })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.name, "pg");
    assert_eq!(cleared.description, None);

    let nested = store.get_project_with_owner(project.id).await.unwrap().unwrap();
    assert_eq!(nested.owner.id, user.id);
    let with_projects = store.get_user_with_projects(user.id).await.unwrap().unwrap();
    assert_eq!(with_projects.projects, vec![cleared]);

    assert!(store.delete_user(user.id).await.unwrap());
    assert!(store.list_projects_for_owner(user.id).await.unwrap().is_empty());
    assert!(store.get_project_with_owner(project.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
async fn project_owner_must_exist() {
    let store = store().await;
    let err = store
        .create_project(&NewProject { name: "orphan".into(), description: None, owner_id: i64::MAX })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
async fn course_paging_follows_insert_order() {
    let store = store().await;
    let n = unique();
    let first = store
        .create_course(&NewCourse { code: format!("PG{n}a"), name: "A".into(), credits: 3 })
        .await
        .unwrap();
    let second = store
        .create_course(&NewCourse { code: format!("PG{n}b"), name: "B".into(), credits: 3 })
        .await
        .unwrap();

    let all = store.list_courses(u32::MAX, 0).await.unwrap();
    let pos = all.iter().position(|c| c.id == first.id).unwrap() as u32;
    let page = store.list_courses(1, pos + 1).await.unwrap();
    assert_eq!(page, vec![second.clone()]);

    match store
        .create_course(&NewCourse { code: second.code.clone(), name: "dup".into(), credits: 3 })
        .await
    {
        Err(StoreError::UniqueViolation(_)) => {}
        other => panic!("expected unique violation, got {other:?}"),
    }
}
