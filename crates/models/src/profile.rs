use crate::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fields that only make sense for a teacher account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeacherProfile {
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub bio: Option<String>,
}

/// Fields that only make sense for a student account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentProfile {
    pub grade: Option<String>,
    pub section: Option<String>,
    /// Always references a parent account when set
    pub parent_id: Option<Uuid>,
}

/// Role-specific payload of an account, tagged by role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Admin,
    Teacher(TeacherProfile),
    Student(StudentProfile),
    Parent,
}

impl Profile {
    /// An empty profile for `role`
    pub fn empty(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Teacher => Self::Teacher(TeacherProfile::default()),
            Role::Student => Self::Student(StudentProfile::default()),
            Role::Parent => Self::Parent,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Admin => Role::Admin,
            Self::Teacher(_) => Role::Teacher,
            Self::Student(_) => Role::Student,
            Self::Parent => Role::Parent,
        }
    }

    pub fn as_teacher(&self) -> Option<&TeacherProfile> {
        match self {
            Self::Teacher(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_student(&self) -> Option<&StudentProfile> {
        match self {
            Self::Student(profile) => Some(profile),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_role_roundtrip() {
        for role in [Role::Admin, Role::Teacher, Role::Student, Role::Parent] {
            assert_eq!(Profile::empty(role).role(), role);
        }
    }

    #[test]
    fn test_profile_is_tagged_by_role() {
        let profile = Profile::Teacher(TeacherProfile {
            subject: Some("Math".to_string()),
            ..Default::default()
        });

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["role"], "teacher");
        assert_eq!(value["subject"], "Math");

        let parent = serde_json::to_value(Profile::Parent).unwrap();
        assert_eq!(parent, json!({ "role": "parent" }));
    }

    #[test]
    fn test_student_fields_absent_on_teacher() {
        let profile = Profile::empty(Role::Teacher);
        assert!(profile.as_student().is_none());
        assert!(profile.as_teacher().is_some());
    }
}
