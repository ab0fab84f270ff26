use chrono::{DateTime, NaiveTime, Utc};
use database::services::reports::{
    Activity, AdminStats, ClassStats, DashboardStats, StudentScheduleEntry, TeacherScheduleEntry,
};
use models::schedule::TimeRange;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub total_students: u64,
    pub total_teachers: u64,
    pub total_parents: u64,
    pub total_classes: u64,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            total_students: stats.total_students,
            total_teachers: stats.total_teachers,
            total_parents: stats.total_parents,
            total_classes: stats.total_classes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub total_students: u64,
    pub total_classes: u64,
    pub active_assignments: u64,
    /// Percentage over the last 30 days
    pub average_attendance: f64,
    pub recent_submissions: u64,
    pub average_grade: f64,
    pub total_grades: u64,
    pub last_updated: DateTime<Utc>,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_students: stats.total_students,
            total_classes: stats.total_classes,
            active_assignments: stats.active_assignments,
            average_attendance: stats.average_attendance,
            recent_submissions: stats.recent_submissions,
            average_grade: stats.average_grade,
            total_grades: stats.total_grades,
            last_updated: stats.last_updated,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassStatsResponse {
    pub class_id: Uuid,
    pub class_name: String,
    pub total_students: u64,
    pub active_assignments: u64,
    pub closed_assignments: u64,
    pub average_grade: f64,
}

impl From<ClassStats> for ClassStatsResponse {
    fn from(stats: ClassStats) -> Self {
        Self {
            class_id: stats.class_id,
            class_name: stats.class_name,
            total_students: stats.total_students,
            active_assignments: stats.active_assignments,
            closed_assignments: stats.closed_assignments,
            average_grade: stats.average_grade,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: Uuid,
    /// `submission`, `attendance` or `grade`
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub class_name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            kind: activity.kind.as_str().to_string(),
            title: activity.title,
            class_name: activity.class_name,
            timestamp: activity.timestamp,
        }
    }
}

fn bounds(time: Option<TimeRange>) -> (Option<NaiveTime>, Option<NaiveTime>) {
    time.map(|t| (Some(t.begin), Some(t.end))).unwrap_or_default()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherScheduleResponse {
    pub day: String,
    /// `HH:MM-HH:MM`
    pub time: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub class_id: Uuid,
    pub class_name: String,
    pub room: Option<String>,
    pub grade: String,
    pub section: String,
}

impl From<TeacherScheduleEntry> for TeacherScheduleResponse {
    fn from(entry: TeacherScheduleEntry) -> Self {
        let (start_time, end_time) = bounds(entry.time);
        Self {
            day: entry.day.to_string(),
            time: entry.time.map(|t| t.to_string()),
            start_time,
            end_time,
            class_id: entry.class_id,
            class_name: entry.class_name,
            room: entry.room,
            grade: entry.grade,
            section: entry.section,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentScheduleResponse {
    pub class_id: Uuid,
    pub subject: String,
    pub teacher_name: String,
    pub room: Option<String>,
    pub day: String,
    pub time: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl From<StudentScheduleEntry> for StudentScheduleResponse {
    fn from(entry: StudentScheduleEntry) -> Self {
        let (start_time, end_time) = bounds(entry.time);
        Self {
            class_id: entry.class_id,
            subject: entry.subject,
            teacher_name: entry
                .teacher_name
                .unwrap_or_else(|| "Not Assigned".to_string()),
            room: entry.room,
            day: entry.day.to_string(),
            time: entry.time.map(|t| t.to_string()),
            start_time,
            end_time,
        }
    }
}
