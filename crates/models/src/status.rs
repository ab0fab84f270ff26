use crate::role::stored_string_enum;
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

stored_string_enum!(ClassStatus, "class status");

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "dropped")]
    Dropped,
    #[sea_orm(string_value = "completed")]
    Completed,
}

stored_string_enum!(EnrollmentStatus, "enrollment status");

/// Persisted assignment state. Overdue is never stored, see [`AssignmentStatus::display`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
}

stored_string_enum!(AssignmentStatus, "assignment status");

impl AssignmentStatus {
    /// The status reported to clients on `today`
    pub fn display(self, due_date: NaiveDate, today: NaiveDate) -> DisplayStatus {
        match self {
            Self::Active if due_date < today => DisplayStatus::Overdue,
            Self::Active => DisplayStatus::Active,
            Self::Closed => DisplayStatus::Closed,
        }
    }
}

/// Assignment status as shown in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DisplayStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "closed")]
    Closed,
    Overdue,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SubmissionStatus {
    #[default]
    #[sea_orm(string_value = "Submitted")]
    Submitted,
    #[sea_orm(string_value = "Graded")]
    Graded,
    #[sea_orm(string_value = "Late")]
    Late,
}

stored_string_enum!(SubmissionStatus, "submission status");

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "graded")]
    Graded,
}

stored_string_enum!(GradeStatus, "grade status");

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[default]
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
}

stored_string_enum!(AttendanceStatus, "attendance status");

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_overdue_is_derived_from_active() {
        let today = date("2025-03-10");

        let status = AssignmentStatus::Active;
        assert_eq!(status.display(date("2025-03-09"), today), DisplayStatus::Overdue);
        assert_eq!(status.display(date("2025-03-10"), today), DisplayStatus::Active);
        assert_eq!(status.display(date("2025-03-11"), today), DisplayStatus::Active);

        // the stored value is untouched
        assert_eq!(status, AssignmentStatus::Active);
        assert_eq!(status.to_string(), "active");
    }

    #[test]
    fn test_closed_never_overdue() {
        let today = date("2025-03-10");
        assert_eq!(
            AssignmentStatus::Closed.display(date("2024-01-01"), today),
            DisplayStatus::Closed
        );
    }

    #[test]
    fn test_display_status_serialization() {
        assert_eq!(serde_json::to_string(&DisplayStatus::Overdue).unwrap(), "\"Overdue\"");
        assert_eq!(serde_json::to_string(&DisplayStatus::Active).unwrap(), "\"active\"");
    }

    #[test]
    fn test_assignment_status_parse_ignores_case() {
        assert_eq!(AssignmentStatus::from_str("Active").unwrap(), AssignmentStatus::Active);
        assert_eq!(AssignmentStatus::from_str("CLOSED").unwrap(), AssignmentStatus::Closed);
        assert!(AssignmentStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_submission_status_values() {
        assert_eq!(SubmissionStatus::default().to_string(), "Submitted");
        assert_eq!(SubmissionStatus::from_str("graded").unwrap(), SubmissionStatus::Graded);
        assert_eq!(serde_json::to_string(&SubmissionStatus::Late).unwrap(), "\"Late\"");
    }

    #[test]
    fn test_attendance_defaults_to_absent() {
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::from_str("Present").unwrap(), AttendanceStatus::Present);
    }
}
