use chrono::{DateTime, NaiveDate, Utc};
use database::{
    entities::attendance,
    services::attendance::{AttendanceEntry, AttendanceRow, StudentAttendance},
};
use models::status::AttendanceStatus;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Required, `YYYY-MM-DD`
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRecordInput {
    pub student_id: Uuid,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl From<AttendanceRecordInput> for AttendanceEntry {
    fn from(input: AttendanceRecordInput) -> Self {
        Self {
            student_id: input.student_id,
            status: input.status,
            notes: input.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceMark {
    pub date: NaiveDate,
    pub records: Vec<AttendanceRecordInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceUpdate {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<attendance::Model> for AttendanceResponse {
    fn from(record: attendance::Model) -> Self {
        Self {
            id: record.id,
            class_id: record.class_id,
            student_id: record.student_id,
            student_name: None,
            date: record.date,
            status: record.status,
            notes: record.notes,
            created_at: record.created_at,
        }
    }
}

impl From<AttendanceRow> for AttendanceResponse {
    fn from(row: AttendanceRow) -> Self {
        Self {
            student_name: Some(row.student_name),
            ..row.record.into()
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentAttendanceQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub class_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentAttendanceResponse {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl From<StudentAttendance> for StudentAttendanceResponse {
    fn from(row: StudentAttendance) -> Self {
        let record = row.record;
        Self {
            id: record.id,
            class_id: record.class_id,
            class_name: row.class_name,
            date: record.date,
            status: record.status,
            notes: record.notes,
        }
    }
}
