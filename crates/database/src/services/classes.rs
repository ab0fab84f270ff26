use crate::{
    entities::{class_enrollments, classes, users},
    error::{ServiceError, ServiceResult},
    services::users::{UserService, UserWithProfile},
};
use chrono::Utc;
use log::info;
use models::{
    Role,
    status::{ClassStatus, EnrollmentStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub grade: String,
    pub section: String,
    pub subject: String,
    pub teacher_id: Uuid,
    pub capacity: i32,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub status: ClassStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub name: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub subject: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub status: Option<ClassStatus>,
}

/// A class with its teacher and actively enrolled students
#[derive(Debug, Clone)]
pub struct ClassDetail {
    pub class: classes::Model,
    pub teacher: Option<UserWithProfile>,
    pub students: Vec<UserWithProfile>,
}

impl ClassDetail {
    /// Always derived from active enrollments
    pub fn current_students(&self) -> u64 {
        self.students.len() as u64
    }
}

pub struct ClassService;

impl ClassService {
    pub async fn create(db: &DatabaseConnection, new_class: NewClass) -> ServiceResult<ClassDetail> {
        validate_name(&new_class.name)?;
        validate_capacity(new_class.capacity)?;

        let txn = db.begin().await?;

        Self::ensure_unique_name(&txn, &new_class.name, None).await?;
        UserService::require_role(&txn, new_class.teacher_id, Role::Teacher).await?;

        let now = Utc::now();
        let class = classes::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_class.name.trim().to_string()),
            grade: Set(new_class.grade),
            section: Set(new_class.section),
            subject: Set(new_class.subject),
            teacher_id: Set(new_class.teacher_id),
            capacity: Set(new_class.capacity),
            schedule: Set(new_class.schedule),
            room: Set(new_class.room),
            status: Set(new_class.status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!("Created class {} ({})", class.name, class.id);

        Self::get(db, class.id).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        changes: ClassChanges,
    ) -> ServiceResult<ClassDetail> {
        let txn = db.begin().await?;

        let class = classes::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::NotFound("class"))?;
        let mut active: classes::ActiveModel = class.clone().into();

        if let Some(name) = changes.name {
            validate_name(&name)?;
            Self::ensure_unique_name(&txn, &name, Some(id)).await?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(teacher_id) = changes.teacher_id {
            UserService::require_role(&txn, teacher_id, Role::Teacher).await?;
            active.teacher_id = Set(teacher_id);
        }
        if let Some(capacity) = changes.capacity {
            validate_capacity(capacity)?;
            let enrolled = Self::active_count(&txn, id).await?;
            if (capacity as u64) < enrolled {
                return Err(ServiceError::validation(format!(
                    "capacity {capacity} is below the {enrolled} enrolled students"
                )));
            }
            active.capacity = Set(capacity);
        }
        if let Some(grade) = changes.grade {
            active.grade = Set(grade);
        }
        if let Some(section) = changes.section {
            active.section = Set(section);
        }
        if let Some(subject) = changes.subject {
            active.subject = Set(subject);
        }
        if let Some(schedule) = changes.schedule {
            active.schedule = Set(Some(schedule));
        }
        if let Some(room) = changes.room {
            active.room = Set(Some(room));
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        active.update(&txn).await?;
        txn.commit().await?;

        Self::get(db, id).await
    }

    /// Deletes a class; enrollments, assignments, grades and attendance go with it
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> ServiceResult<classes::Model> {
        let class = classes::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("class"))?;

        classes::Entity::delete_by_id(id).exec(db).await?;
        info!("Deleted class {} ({})", class.name, class.id);

        Ok(class)
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> ServiceResult<ClassDetail> {
        let class = classes::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("class"))?;

        Ok(Self::details(db, vec![class]).await?.remove(0))
    }

    pub async fn list(db: &DatabaseConnection) -> ServiceResult<Vec<ClassDetail>> {
        let classes = classes::Entity::find()
            .order_by_asc(classes::Column::Name)
            .all(db)
            .await?;

        Ok(Self::details(db, classes).await?)
    }

    /// A class owned by `teacher_id`; classes of other teachers look missing
    pub async fn owned<C: ConnectionTrait>(
        db: &C,
        class_id: Uuid,
        teacher_id: Uuid,
    ) -> ServiceResult<classes::Model> {
        classes::Entity::find_by_id(class_id)
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("class"))
    }

    pub async fn active_count<C: ConnectionTrait>(db: &C, class_id: Uuid) -> Result<u64, DbErr> {
        class_enrollments::Entity::find()
            .filter(class_enrollments::Column::ClassId.eq(class_id))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .count(db)
            .await
    }

    /// Active enrollment counts for many classes in one query
    pub async fn active_counts<C: ConnectionTrait>(
        db: &C,
        class_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, u64>, DbErr> {
        if class_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = class_enrollments::Entity::find()
            .select_only()
            .column(class_enrollments::Column::ClassId)
            .column_as(class_enrollments::Column::Id.count(), "count")
            .filter(class_enrollments::Column::ClassId.is_in(class_ids))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .group_by(class_enrollments::Column::ClassId)
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(class_id, count)| (class_id, count.max(0) as u64))
            .collect())
    }

    /// Students with an active enrollment, keyed by class
    pub async fn active_students<C: ConnectionTrait>(
        db: &C,
        class_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<UserWithProfile>>, DbErr> {
        if class_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let enrollments = class_enrollments::Entity::find()
            .filter(class_enrollments::Column::ClassId.is_in(class_ids))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .all(db)
            .await?;

        let student_ids: Vec<Uuid> = enrollments.iter().map(|e| e.student_id).collect();
        let students: HashMap<Uuid, UserWithProfile> = UserService::with_profiles(
            db,
            users::Entity::find()
                .filter(users::Column::Id.is_in(student_ids))
                .order_by_asc(users::Column::FullName)
                .all(db)
                .await?,
        )
        .await?
        .into_iter()
        .map(|user| (user.account.id, user))
        .collect();

        let mut by_class: HashMap<Uuid, Vec<UserWithProfile>> = HashMap::new();
        for enrollment in enrollments {
            if let Some(student) = students.get(&enrollment.student_id) {
                by_class
                    .entry(enrollment.class_id)
                    .or_default()
                    .push(student.clone());
            }
        }
        for students in by_class.values_mut() {
            students.sort_by(|a, b| a.account.full_name.cmp(&b.account.full_name));
        }

        Ok(by_class)
    }

    async fn details<C: ConnectionTrait>(
        db: &C,
        classes: Vec<classes::Model>,
    ) -> Result<Vec<ClassDetail>, DbErr> {
        let class_ids: Vec<Uuid> = classes.iter().map(|c| c.id).collect();
        let teacher_ids: Vec<Uuid> = classes.iter().map(|c| c.teacher_id).collect();

        let mut students = Self::active_students(db, class_ids).await?;
        let teachers: HashMap<Uuid, UserWithProfile> = UserService::with_profiles(
            db,
            users::Entity::find()
                .filter(users::Column::Id.is_in(teacher_ids))
                .all(db)
                .await?,
        )
        .await?
        .into_iter()
        .map(|user| (user.account.id, user))
        .collect();

        Ok(classes
            .into_iter()
            .map(|class| ClassDetail {
                teacher: teachers.get(&class.teacher_id).cloned(),
                students: students.remove(&class.id).unwrap_or_default(),
                class,
            })
            .collect())
    }

    async fn ensure_unique_name<C: ConnectionTrait>(
        db: &C,
        name: &str,
        except: Option<Uuid>,
    ) -> ServiceResult<()> {
        let existing = classes::Entity::find()
            .filter(classes::Column::Name.eq(name.trim()))
            .one(db)
            .await?;

        match existing {
            Some(class) if Some(class.id) != except => {
                Err(ServiceError::conflict("Class name already exists"))
            }
            _ => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("class name must not be empty"));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> ServiceResult<()> {
    if capacity <= 0 {
        return Err(ServiceError::validation("capacity must be positive"));
    }
    Ok(())
}
