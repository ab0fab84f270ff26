#![allow(dead_code)]

use database::{
    db::{PoolOptions, create_connection},
    entities::classes,
    services::{
        classes::{ClassService, NewClass},
        users::{NewUser, UserService, UserWithProfile},
    },
};
use migration::{Migrator, MigratorTrait};
use models::{
    Profile, StudentProfile, TeacherProfile,
    status::ClassStatus,
};
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse battery staple";

/// A migrated SQLite database living in a temporary directory
pub struct TestDb {
    pub db: DatabaseConnection,
    pub dir: TempDir,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("school.db").display());

    let db = create_connection(&url, &PoolOptions::default()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    TestDb { db, dir }
}

pub async fn register(db: &DatabaseConnection, name: &str, profile: Profile) -> UserWithProfile {
    UserService::register(
        db,
        NewUser {
            email: format!("{}@school.test", name.to_lowercase().replace(' ', ".")),
            full_name: name.to_string(),
            password: PASSWORD.to_string(),
            contact: None,
            is_active: true,
            profile,
        },
    )
    .await
    .unwrap()
}

pub async fn teacher(db: &DatabaseConnection, name: &str) -> UserWithProfile {
    register(db, name, Profile::Teacher(TeacherProfile::default())).await
}

pub async fn student(db: &DatabaseConnection, name: &str, grade: &str, section: &str) -> UserWithProfile {
    register(
        db,
        name,
        Profile::Student(StudentProfile {
            grade: Some(grade.to_string()),
            section: Some(section.to_string()),
            parent_id: None,
        }),
    )
    .await
}

pub async fn class(
    db: &DatabaseConnection,
    teacher: &UserWithProfile,
    name: &str,
    grade: &str,
    section: &str,
    capacity: i32,
) -> classes::Model {
    ClassService::create(
        db,
        NewClass {
            name: name.to_string(),
            grade: grade.to_string(),
            section: section.to_string(),
            subject: "Mathematics".to_string(),
            teacher_id: teacher.account.id,
            capacity,
            schedule: Some("Mon, Wed 09:00-10:30".to_string()),
            room: Some("101".to_string()),
            status: ClassStatus::Active,
        },
    )
    .await
    .unwrap()
    .class
}
