use crate::{
    entities::{classes, student_profiles, teacher_profiles, users},
    error::{ServiceError, ServiceResult},
    services::credentials,
};
use chrono::Utc;
use log::info;
use models::{Profile, Role, StudentProfile, TeacherProfile, status::ClassStatus};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};
use std::collections::HashMap;
use uuid::Uuid;

/// An account together with its role-specific profile
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithProfile {
    pub account: users::Model,
    pub profile: Profile,
}

impl UserWithProfile {
    pub fn student(&self) -> Option<&StudentProfile> {
        self.profile.as_student()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub contact: Option<String>,
    pub is_active: bool,
    pub profile: Profile,
}

/// Field-by-field changes to an account. Profile fields must match the account's role.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub contact: Option<String>,
    pub is_active: Option<bool>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub parent_id: Option<Uuid>,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub bio: Option<String>,
}

impl UserChanges {
    fn touches_student(&self) -> bool {
        self.grade.is_some() || self.section.is_some() || self.parent_id.is_some()
    }

    fn touches_teacher(&self) -> bool {
        self.subject.is_some() || self.qualification.is_some() || self.bio.is_some()
    }
}

/// Result of linking a student to a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked { previous_parent: Option<Uuid> },
    AlreadyLinked,
}

pub struct UserService;

impl UserService {
    pub async fn register(db: &DatabaseConnection, new_user: NewUser) -> ServiceResult<UserWithProfile> {
        let email = normalize_email(&new_user.email)?;
        if new_user.full_name.trim().is_empty() {
            return Err(ServiceError::validation("full_name must not be empty"));
        }
        if new_user.password.is_empty() {
            return Err(ServiceError::validation("password must not be empty"));
        }

        let txn = db.begin().await?;

        if Self::find_by_email(&txn, &email).await?.is_some() {
            return Err(ServiceError::conflict("Email already registered"));
        }
        if let Profile::Student(StudentProfile {
            parent_id: Some(parent_id),
            ..
        }) = &new_user.profile
        {
            Self::require_role(&txn, *parent_id, Role::Parent).await?;
        }

        let now = Utc::now();
        let account = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            full_name: Set(new_user.full_name.trim().to_string()),
            password_hash: Set(credentials::hash_password(&new_user.password)?),
            role: Set(new_user.profile.role()),
            is_active: Set(new_user.is_active),
            contact: Set(new_user.contact),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        Self::save_profile(&txn, account.id, &new_user.profile, false).await?;
        txn.commit().await?;

        info!("Registered {} account {}", account.role, account.email);
        Ok(UserWithProfile {
            account,
            profile: new_user.profile,
        })
    }

    /// Checks a password against the stored hash. Never mutates the store.
    pub async fn authenticate(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> ServiceResult<users::Model> {
        let email = email.trim().to_lowercase();
        let account = Self::find_by_email(db, &email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !credentials::verify_password(password, &account.password_hash) {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(account)
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }

    /// Loads an account and fails unless it has `role`
    pub async fn require_role<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        role: Role,
    ) -> ServiceResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .filter(|account| account.role == role)
            .ok_or(ServiceError::NotFound(role_noun(role)))
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> ServiceResult<UserWithProfile> {
        let account = users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        Ok(Self::with_profile(db, account).await?)
    }

    pub async fn get_with_role(
        db: &DatabaseConnection,
        id: Uuid,
        role: Role,
    ) -> ServiceResult<UserWithProfile> {
        let account = Self::require_role(db, id, role).await?;
        Ok(Self::with_profile(db, account).await?)
    }

    pub async fn list(db: &DatabaseConnection, role: Option<Role>) -> ServiceResult<Vec<UserWithProfile>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::FullName);
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role));
        }

        let accounts = query.all(db).await?;
        Ok(Self::with_profiles(db, accounts).await?)
    }

    /// Applies `changes` to an account; `role` restricts which accounts may be touched
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        role: Option<Role>,
        changes: UserChanges,
    ) -> ServiceResult<UserWithProfile> {
        let txn = db.begin().await?;

        let account = match role {
            Some(role) => Self::require_role(&txn, id, role).await?,
            None => users::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or(ServiceError::NotFound("user"))?,
        };

        let mut profile = Self::with_profile(&txn, account.clone()).await?.profile;
        match &mut profile {
            Profile::Student(student) => {
                if changes.touches_teacher() {
                    return Err(ServiceError::validation(
                        "subject, qualification and bio only apply to teachers",
                    ));
                }
                if let Some(parent_id) = changes.parent_id {
                    Self::require_role(&txn, parent_id, Role::Parent).await?;
                    student.parent_id = Some(parent_id);
                }
                if let Some(grade) = changes.grade.clone() {
                    student.grade = Some(grade);
                }
                if let Some(section) = changes.section.clone() {
                    student.section = Some(section);
                }
            }
            Profile::Teacher(teacher) => {
                if changes.touches_student() {
                    return Err(ServiceError::validation(
                        "grade, section and parent_id only apply to students",
                    ));
                }
                if let Some(subject) = changes.subject.clone() {
                    teacher.subject = Some(subject);
                }
                if let Some(qualification) = changes.qualification.clone() {
                    teacher.qualification = Some(qualification);
                }
                if let Some(bio) = changes.bio.clone() {
                    teacher.bio = Some(bio);
                }
            }
            Profile::Admin | Profile::Parent => {
                if changes.touches_student() || changes.touches_teacher() {
                    return Err(ServiceError::validation(format!(
                        "{} accounts have no profile fields",
                        account.role
                    )));
                }
            }
        }

        let mut active: users::ActiveModel = account.clone().into();
        if let Some(email) = changes.email {
            let email = normalize_email(&email)?;
            if email != account.email {
                if Self::find_by_email(&txn, &email).await?.is_some() {
                    return Err(ServiceError::conflict("Email already registered"));
                }
                active.email = Set(email);
            }
        }
        if let Some(full_name) = changes.full_name {
            if full_name.trim().is_empty() {
                return Err(ServiceError::validation("full_name must not be empty"));
            }
            active.full_name = Set(full_name.trim().to_string());
        }
        if let Some(password) = changes.password {
            active.password_hash = Set(credentials::hash_password(&password)?);
        }
        if let Some(contact) = changes.contact {
            active.contact = Set(Some(contact));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let account = active.update(&txn).await?;
        Self::save_profile(&txn, account.id, &profile, true).await?;
        txn.commit().await?;

        Ok(UserWithProfile { account, profile })
    }

    /// Deletes an account. Teachers that still own classes are kept.
    pub async fn delete(db: &DatabaseConnection, id: Uuid, role: Option<Role>) -> ServiceResult<users::Model> {
        let txn = db.begin().await?;

        let account = match role {
            Some(role) => Self::require_role(&txn, id, role).await?,
            None => users::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or(ServiceError::NotFound("user"))?,
        };

        if account.role == Role::Teacher {
            let class_count = classes::Entity::find()
                .filter(classes::Column::TeacherId.eq(account.id))
                .count(&txn)
                .await?;
            if class_count > 0 {
                return Err(ServiceError::conflict(format!(
                    "Cannot delete teacher with {class_count} assigned classes"
                )));
            }
        }

        if account.role == Role::Parent {
            student_profiles::Entity::update_many()
                .col_expr(
                    student_profiles::Column::ParentId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(student_profiles::Column::ParentId.eq(account.id))
                .exec(&txn)
                .await?;
        }

        users::Entity::delete_by_id(account.id).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted {} account {}", account.role, account.email);
        Ok(account)
    }

    pub async fn link_student(
        db: &DatabaseConnection,
        parent_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<LinkOutcome> {
        let txn = db.begin().await?;

        Self::require_role(&txn, parent_id, Role::Parent).await?;
        let student = Self::require_role(&txn, student_id, Role::Student).await?;
        let profile = Self::with_profile(&txn, student).await?;
        let Profile::Student(mut student_profile) = profile.profile else {
            return Err(ServiceError::NotFound("student"));
        };

        let previous_parent = student_profile.parent_id;
        if previous_parent == Some(parent_id) {
            return Ok(LinkOutcome::AlreadyLinked);
        }

        student_profile.parent_id = Some(parent_id);
        Self::save_profile(&txn, student_id, &Profile::Student(student_profile), true).await?;
        txn.commit().await?;

        Ok(LinkOutcome::Linked { previous_parent })
    }

    /// Returns false when the student was not linked to this parent
    pub async fn unlink_student(
        db: &DatabaseConnection,
        parent_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<bool> {
        let txn = db.begin().await?;

        Self::require_role(&txn, parent_id, Role::Parent).await?;
        Self::require_role(&txn, student_id, Role::Student).await?;

        let result = student_profiles::Entity::update_many()
            .col_expr(
                student_profiles::Column::ParentId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(student_profiles::Column::UserId.eq(student_id))
            .filter(student_profiles::Column::ParentId.eq(parent_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn parent_students(
        db: &DatabaseConnection,
        parent_id: Uuid,
    ) -> ServiceResult<Vec<UserWithProfile>> {
        Self::require_role(db, parent_id, Role::Parent).await?;

        let student_ids: Vec<Uuid> = student_profiles::Entity::find()
            .filter(student_profiles::Column::ParentId.eq(parent_id))
            .all(db)
            .await?
            .into_iter()
            .map(|profile| profile.user_id)
            .collect();

        let accounts = users::Entity::find()
            .filter(users::Column::Id.is_in(student_ids))
            .order_by_asc(users::Column::FullName)
            .all(db)
            .await?;

        Ok(Self::with_profiles(db, accounts).await?)
    }

    /// A teacher's profile; an empty subject is filled from their first active class
    pub async fn teacher_profile(db: &DatabaseConnection, teacher_id: Uuid) -> ServiceResult<UserWithProfile> {
        let mut user = Self::get_with_role(db, teacher_id, Role::Teacher).await?;

        let needs_subject = user
            .profile
            .as_teacher()
            .is_some_and(|teacher| teacher.subject.as_deref().is_none_or(str::is_empty));
        if !needs_subject {
            return Ok(user);
        }

        let first_class = classes::Entity::find()
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .filter(classes::Column::Status.eq(ClassStatus::Active))
            .order_by_asc(classes::Column::CreatedAt)
            .one(db)
            .await?;

        if let (Some(class), Profile::Teacher(teacher)) = (first_class, &mut user.profile) {
            teacher.subject = Some(class.subject);
            Self::save_profile(db, teacher_id, &user.profile, true).await?;
        }

        Ok(user)
    }

    pub async fn with_profile<C: ConnectionTrait>(
        db: &C,
        account: users::Model,
    ) -> Result<UserWithProfile, DbErr> {
        let profile = match account.role {
            Role::Admin => Profile::Admin,
            Role::Parent => Profile::Parent,
            Role::Teacher => Profile::Teacher(
                teacher_profiles::Entity::find_by_id(account.id)
                    .one(db)
                    .await?
                    .map(TeacherProfile::from)
                    .unwrap_or_default(),
            ),
            Role::Student => Profile::Student(
                student_profiles::Entity::find_by_id(account.id)
                    .one(db)
                    .await?
                    .map(StudentProfile::from)
                    .unwrap_or_default(),
            ),
        };

        Ok(UserWithProfile { account, profile })
    }

    /// Attaches profiles to many accounts with one query per profile table
    pub async fn with_profiles<C: ConnectionTrait>(
        db: &C,
        accounts: Vec<users::Model>,
    ) -> Result<Vec<UserWithProfile>, DbErr> {
        let ids_with = |role: Role| -> Vec<Uuid> {
            accounts
                .iter()
                .filter(|account| account.role == role)
                .map(|account| account.id)
                .collect()
        };
        let student_ids = ids_with(Role::Student);
        let teacher_ids = ids_with(Role::Teacher);

        let mut students: HashMap<Uuid, student_profiles::Model> = HashMap::new();
        if !student_ids.is_empty() {
            students = student_profiles::Entity::find()
                .filter(student_profiles::Column::UserId.is_in(student_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|profile| (profile.user_id, profile))
                .collect();
        }

        let mut teachers: HashMap<Uuid, teacher_profiles::Model> = HashMap::new();
        if !teacher_ids.is_empty() {
            teachers = teacher_profiles::Entity::find()
                .filter(teacher_profiles::Column::UserId.is_in(teacher_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|profile| (profile.user_id, profile))
                .collect();
        }

        Ok(accounts
            .into_iter()
            .map(|account| {
                let profile = match account.role {
                    Role::Admin => Profile::Admin,
                    Role::Parent => Profile::Parent,
                    Role::Teacher => Profile::Teacher(
                        teachers.remove(&account.id).map(Into::into).unwrap_or_default(),
                    ),
                    Role::Student => Profile::Student(
                        students.remove(&account.id).map(Into::into).unwrap_or_default(),
                    ),
                };
                UserWithProfile { account, profile }
            })
            .collect())
    }

    /// Writes the profile row for `user_id`, inserting it when missing
    pub(crate) async fn save_profile<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        profile: &Profile,
        may_exist: bool,
    ) -> Result<(), DbErr> {
        match profile {
            Profile::Teacher(teacher) => {
                let model = teacher_profiles::ActiveModel {
                    user_id: Set(user_id),
                    subject: Set(teacher.subject.clone()),
                    qualification: Set(teacher.qualification.clone()),
                    bio: Set(teacher.bio.clone()),
                };
                let exists = may_exist
                    && teacher_profiles::Entity::find_by_id(user_id)
                        .one(db)
                        .await?
                        .is_some();
                if exists {
                    model.update(db).await?;
                } else {
                    model.insert(db).await?;
                }
            }
            Profile::Student(student) => {
                let model = student_profiles::ActiveModel {
                    user_id: Set(user_id),
                    grade: Set(student.grade.clone()),
                    section: Set(student.section.clone()),
                    parent_id: Set(student.parent_id),
                };
                let exists = may_exist
                    && student_profiles::Entity::find_by_id(user_id)
                        .one(db)
                        .await?
                        .is_some();
                if exists {
                    model.update(db).await?;
                } else {
                    model.insert(db).await?;
                }
            }
            Profile::Admin | Profile::Parent => {}
        }

        Ok(())
    }
}

pub(crate) fn role_noun(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Teacher => "teacher",
        Role::Student => "student",
        Role::Parent => "parent",
    }
}

fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ServiceError::validation(format!("invalid email address: {email}"))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Ada@School.EDU ").unwrap(), "ada@school.edu");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@school.edu").is_err());
        assert!(normalize_email("ada@localhost").is_err());
    }

    #[test]
    fn test_changes_scope() {
        let changes = UserChanges {
            grade: Some("5".into()),
            ..Default::default()
        };
        assert!(changes.touches_student());
        assert!(!changes.touches_teacher());
    }
}
