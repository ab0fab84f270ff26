use chrono::{DateTime, Utc};
use database::services::users::{NewUser, UserChanges, UserWithProfile};
use models::{Profile, Role, StudentProfile, TeacherProfile};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// An account with the profile fields of its role
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserWithProfile> for UserResponse {
    fn from(user: UserWithProfile) -> Self {
        let account = user.account;
        let mut response = Self {
            id: account.id,
            email: account.email,
            full_name: account.full_name,
            role: account.role,
            is_active: account.is_active,
            contact: account.contact,
            grade: None,
            section: None,
            parent_id: None,
            subject: None,
            qualification: None,
            bio: None,
            created_at: account.created_at,
            updated_at: account.updated_at,
        };

        match user.profile {
            Profile::Student(student) => {
                response.grade = student.grade;
                response.section = student.section;
                response.parent_id = student.parent_id;
            }
            Profile::Teacher(teacher) => {
                response.subject = teacher.subject;
                response.qualification = teacher.qualification;
                response.bio = teacher.bio;
            }
            Profile::Admin | Profile::Parent => {}
        }

        response
    }
}

/// A new account. Fields not belonging to the role are ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// Required for self registration, ignored on role specific admin routes
    pub role: Option<Role>,
    pub contact: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub parent_id: Option<Uuid>,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub bio: Option<String>,
}

fn default_active() -> bool {
    true
}

impl UserCreate {
    pub fn into_new_user(self, role: Role) -> NewUser {
        let profile = match role {
            Role::Admin => Profile::Admin,
            Role::Parent => Profile::Parent,
            Role::Teacher => Profile::Teacher(TeacherProfile {
                subject: self.subject,
                qualification: self.qualification,
                bio: self.bio,
            }),
            Role::Student => Profile::Student(StudentProfile {
                grade: self.grade,
                section: self.section,
                parent_id: self.parent_id,
            }),
        };

        NewUser {
            email: self.email,
            full_name: self.full_name,
            password: self.password,
            contact: self.contact,
            is_active: self.is_active,
            profile,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
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

impl From<UserUpdate> for UserChanges {
    fn from(update: UserUpdate) -> Self {
        Self {
            email: update.email,
            full_name: update.full_name,
            password: update.password,
            contact: update.contact,
            is_active: update.is_active,
            grade: update.grade,
            section: update.section,
            parent_id: update.parent_id,
            subject: update.subject,
            qualification: update.qualification,
            bio: update.bio,
        }
    }
}

/// Fields a teacher may change on their own profile
#[derive(Debug, Deserialize, ToSchema)]
pub struct TeacherProfileUpdate {
    pub full_name: Option<String>,
    pub contact: Option<String>,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub bio: Option<String>,
}

impl From<TeacherProfileUpdate> for UserChanges {
    fn from(update: TeacherProfileUpdate) -> Self {
        Self {
            full_name: update.full_name,
            contact: update.contact,
            subject: update.subject,
            qualification: update.qualification,
            bio: update.bio,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    /// One of admin, teacher, student, parent
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromotionRequest {
    pub from_grade: String,
    pub from_section: String,
    pub to_grade: String,
    pub to_section: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParentLinkResponse {
    pub message: String,
    pub previous_parent_id: Option<Uuid>,
}
