use crate::{
    entities::{class_enrollments, classes, student_profiles, users},
    error::{ServiceError, ServiceResult},
    services::{
        classes::ClassService,
        users::{UserService, UserWithProfile},
    },
};
use chrono::Utc;
use log::info;
use models::{
    Profile, Role,
    status::{ClassStatus, EnrollmentStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Moves every active student of one grade/section to another
#[derive(Debug, Clone)]
pub struct Promotion {
    pub from_grade: String,
    pub from_section: String,
    pub to_grade: String,
    pub to_section: String,
}

/// An active enrollment with the enrolled student
#[derive(Debug, Clone)]
pub struct EnrolledStudent {
    pub enrollment: class_enrollments::Model,
    pub student: UserWithProfile,
}

pub struct RosterService;

impl RosterService {
    /// Enrolls a batch of students. The whole batch fails if it would exceed capacity.
    pub async fn enroll(
        db: &DatabaseConnection,
        class_id: Uuid,
        student_ids: &[Uuid],
    ) -> ServiceResult<Vec<class_enrollments::Model>> {
        let mut seen = HashSet::new();
        let student_ids: Vec<Uuid> = student_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if student_ids.is_empty() {
            return Err(ServiceError::validation("student_ids must not be empty"));
        }

        let txn = db.begin().await?;

        let class = classes::Entity::find_by_id(class_id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::NotFound("class"))?;

        let enrolled = ClassService::active_count(&txn, class_id).await?;
        let capacity = class.capacity.max(0) as u64;
        if enrolled + student_ids.len() as u64 > capacity {
            return Err(ServiceError::conflict(format!(
                "Class capacity exceeded: {enrolled} of {capacity} seats taken, {} requested",
                student_ids.len()
            )));
        }

        let mut enrollments = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            let student = UserService::require_role(&txn, student_id, Role::Student).await?;
            if Self::active_enrollment(&txn, class_id, student_id)
                .await?
                .is_some()
            {
                return Err(ServiceError::conflict(format!(
                    "Student {} is already enrolled in {}",
                    student.full_name, class.name
                )));
            }

            enrollments.push(Self::insert_active(&txn, class_id, student_id).await?);
        }

        txn.commit().await?;
        info!(
            "Enrolled {} students in class {}",
            enrollments.len(),
            class.name
        );

        Ok(enrollments)
    }

    /// Marks an active enrollment as dropped
    pub async fn drop_student(
        db: &DatabaseConnection,
        class_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<class_enrollments::Model> {
        let enrollment = Self::active_enrollment(db, class_id, student_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))?;

        let mut active: class_enrollments::ActiveModel = enrollment.into();
        active.status = Set(EnrollmentStatus::Dropped);

        Ok(active.update(db).await?)
    }

    /// Moves students to a new grade/section and re-enrolls them in every class of the destination
    pub async fn promote(db: &DatabaseConnection, promotion: Promotion) -> ServiceResult<Vec<UserWithProfile>> {
        let txn = db.begin().await?;

        let students: Vec<(student_profiles::Model, users::Model)> = student_profiles::Entity::find()
            .filter(student_profiles::Column::Grade.eq(promotion.from_grade.as_str()))
            .filter(student_profiles::Column::Section.eq(promotion.from_section.as_str()))
            .find_also_related(users::Entity)
            .all(&txn)
            .await?
            .into_iter()
            .filter_map(|(profile, account)| account.map(|account| (profile, account)))
            .filter(|(_, account)| account.is_active && account.role == Role::Student)
            .collect();

        if students.is_empty() {
            return Err(ServiceError::NotFound("students in the source grade and section"));
        }

        let old_classes = Self::classes_for(&txn, &promotion.from_grade, &promotion.from_section).await?;
        let new_classes = Self::classes_for(&txn, &promotion.to_grade, &promotion.to_section).await?;

        let mut promoted = Vec::with_capacity(students.len());
        for (profile, account) in students {
            let mut active: student_profiles::ActiveModel = profile.clone().into();
            active.grade = Set(Some(promotion.to_grade.clone()));
            active.section = Set(Some(promotion.to_section.clone()));
            let profile = active.update(&txn).await?;

            class_enrollments::Entity::delete_many()
                .filter(class_enrollments::Column::StudentId.eq(account.id))
                .filter(class_enrollments::Column::ClassId.is_in(old_classes.clone()))
                .exec(&txn)
                .await?;

            for &class_id in &new_classes {
                if Self::active_enrollment(&txn, class_id, account.id)
                    .await?
                    .is_none()
                {
                    Self::insert_active(&txn, class_id, account.id).await?;
                }
            }

            promoted.push(UserWithProfile {
                account,
                profile: Profile::Student(profile.into()),
            });
        }

        txn.commit().await?;
        info!(
            "Promoted {} students from {}-{} to {}-{}",
            promoted.len(),
            promotion.from_grade,
            promotion.from_section,
            promotion.to_grade,
            promotion.to_section
        );

        Ok(promoted)
    }

    /// Every enrollment of a class, whatever its status
    pub async fn enrollments(
        db: &DatabaseConnection,
        class_id: Uuid,
    ) -> ServiceResult<Vec<class_enrollments::Model>> {
        classes::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("class"))?;

        Ok(class_enrollments::Entity::find()
            .filter(class_enrollments::Column::ClassId.eq(class_id))
            .order_by_asc(class_enrollments::Column::EnrollmentDate)
            .all(db)
            .await?)
    }

    /// Actively enrolled students of a class, ordered by name
    pub async fn class_students<C: ConnectionTrait>(
        db: &C,
        class_id: Uuid,
    ) -> Result<Vec<EnrolledStudent>, DbErr> {
        let enrollments = class_enrollments::Entity::find()
            .filter(class_enrollments::Column::ClassId.eq(class_id))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .find_also_related(users::Entity)
            .all(db)
            .await?;

        let accounts = enrollments
            .iter()
            .filter_map(|(_, account)| account.clone())
            .collect();
        let mut students = UserService::with_profiles(db, accounts).await?.into_iter();

        let mut result: Vec<EnrolledStudent> = enrollments
            .into_iter()
            .filter(|(_, account)| account.is_some())
            .filter_map(|(enrollment, _)| {
                students
                    .next()
                    .map(|student| EnrolledStudent { enrollment, student })
            })
            .collect();
        result.sort_by(|a, b| a.student.account.full_name.cmp(&b.student.account.full_name));

        Ok(result)
    }

    /// Active classes a student is actively enrolled in
    pub async fn student_classes(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> ServiceResult<Vec<classes::Model>> {
        Ok(classes::Entity::find()
            .inner_join(class_enrollments::Entity)
            .filter(class_enrollments::Column::StudentId.eq(student_id))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .filter(classes::Column::Status.eq(ClassStatus::Active))
            .order_by_asc(classes::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn active_enrollment<C: ConnectionTrait>(
        db: &C,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<class_enrollments::Model>, DbErr> {
        class_enrollments::Entity::find()
            .filter(class_enrollments::Column::ClassId.eq(class_id))
            .filter(class_enrollments::Column::StudentId.eq(student_id))
            .filter(class_enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .one(db)
            .await
    }

    async fn insert_active<C: ConnectionTrait>(
        db: &C,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<class_enrollments::Model, DbErr> {
        class_enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(student_id),
            class_id: Set(class_id),
            status: Set(EnrollmentStatus::Active),
            enrollment_date: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    async fn classes_for<C: ConnectionTrait>(
        db: &C,
        grade: &str,
        section: &str,
    ) -> Result<Vec<Uuid>, DbErr> {
        Ok(classes::Entity::find()
            .filter(classes::Column::Grade.eq(grade))
            .filter(classes::Column::Section.eq(section))
            .all(db)
            .await?
            .into_iter()
            .map(|class| class.id)
            .collect())
    }
}
