use crate::{
    entities::{assignment_submissions, assignments, attendance, classes, grades, users},
    error::ServiceResult,
    services::{
        classes::{ClassDetail, ClassService},
        roster::RosterService,
    },
};
use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use models::{
    Role,
    schedule::{ClassSchedule, TimeRange},
    status::{AssignmentStatus, AttendanceStatus, ClassStatus},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::HashMap;
use uuid::Uuid;

const RECENT_DAYS: i64 = 30;
const ACTIVITIES_PER_KIND: u64 = 5;
const ACTIVITY_LIMIT: usize = 10;
const RECENT_ASSIGNMENTS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub total_students: u64,
    pub total_teachers: u64,
    pub total_parents: u64,
    pub total_classes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_students: u64,
    pub total_classes: u64,
    pub active_assignments: u64,
    pub average_attendance: f64,
    pub recent_submissions: u64,
    pub average_grade: f64,
    pub total_grades: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassStats {
    pub class_id: Uuid,
    pub class_name: String,
    pub total_students: u64,
    pub active_assignments: u64,
    pub closed_assignments: u64,
    pub average_grade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Submission,
    Attendance,
    Grade,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Attendance => "attendance",
            Self::Grade => "grade",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub title: String,
    pub class_name: String,
    pub timestamp: DateTime<Utc>,
}

/// An active class of a teacher with its latest active assignments
#[derive(Debug, Clone)]
pub struct TeacherClass {
    pub class: classes::Model,
    pub students_count: u64,
    pub recent_assignments: Vec<assignments::Model>,
}

/// A class a student attends with the name of its teacher
#[derive(Debug, Clone)]
pub struct StudentClass {
    pub class: classes::Model,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherScheduleEntry {
    pub day: &'static str,
    pub time: Option<TimeRange>,
    pub class_id: Uuid,
    pub class_name: String,
    pub room: Option<String>,
    pub grade: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentScheduleEntry {
    pub class_id: Uuid,
    pub subject: String,
    pub teacher_name: Option<String>,
    pub room: Option<String>,
    pub day: &'static str,
    pub time: Option<TimeRange>,
}

pub struct ReportService;

impl ReportService {
    pub async fn admin_stats(db: &DatabaseConnection) -> ServiceResult<AdminStats> {
        let count_role = |role: Role| {
            users::Entity::find()
                .filter(users::Column::Role.eq(role))
                .count(db)
        };

        Ok(AdminStats {
            total_students: count_role(Role::Student).await?,
            total_teachers: count_role(Role::Teacher).await?,
            total_parents: count_role(Role::Parent).await?,
            total_classes: classes::Entity::find()
                .filter(classes::Column::Status.eq(ClassStatus::Active))
                .count(db)
                .await?,
        })
    }

    pub async fn teacher_dashboard(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        today: NaiveDate,
    ) -> ServiceResult<DashboardStats> {
        let class_ids = active_class_ids(db, teacher_id).await?;
        let since = today - Duration::days(RECENT_DAYS);

        let total_students = ClassService::active_counts(db, class_ids.clone())
            .await?
            .values()
            .sum();

        let active_assignments = assignments::Entity::find()
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .filter(assignments::Column::ClassId.is_in(class_ids.clone()))
            .filter(assignments::Column::Status.eq(AssignmentStatus::Active))
            .count(db)
            .await?;

        let recent_attendance: Vec<AttendanceStatus> = attendance::Entity::find()
            .select_only()
            .column(attendance::Column::Status)
            .filter(attendance::Column::ClassId.is_in(class_ids.clone()))
            .filter(attendance::Column::Date.gte(since))
            .into_tuple()
            .all(db)
            .await?;
        let present = recent_attendance
            .iter()
            .filter(|status| **status == AttendanceStatus::Present)
            .count();

        let recent_submissions = assignment_submissions::Entity::find()
            .inner_join(assignments::Entity)
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .filter(
                assignment_submissions::Column::SubmissionDate
                    .gte(Utc::now() - Duration::days(RECENT_DAYS)),
            )
            .count(db)
            .await?;

        let (scores, total_grades) = class_scores(db, class_ids.clone()).await?;

        Ok(DashboardStats {
            total_students,
            total_classes: class_ids.len() as u64,
            active_assignments,
            average_attendance: percentage(present, recent_attendance.len()),
            recent_submissions,
            average_grade: average(&scores),
            total_grades,
            last_updated: Utc::now(),
        })
    }

    pub async fn class_stats(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
    ) -> ServiceResult<ClassStats> {
        let class = ClassService::owned(db, class_id, teacher_id).await?;

        let statuses: Vec<AssignmentStatus> = assignments::Entity::find()
            .select_only()
            .column(assignments::Column::Status)
            .filter(assignments::Column::ClassId.eq(class_id))
            .into_tuple()
            .all(db)
            .await?;
        let active_assignments = statuses
            .iter()
            .filter(|s| **s == AssignmentStatus::Active)
            .count() as u64;

        let (scores, _) = class_scores(db, vec![class_id]).await?;

        Ok(ClassStats {
            class_id,
            total_students: ClassService::active_count(db, class_id).await?,
            active_assignments,
            closed_assignments: statuses.len() as u64 - active_assignments,
            average_grade: average(&scores),
            class_name: class.name,
        })
    }

    /// Latest submissions, attendance marks and grades across the teacher's classes
    pub async fn activities(
        db: &DatabaseConnection,
        teacher_id: Uuid,
    ) -> ServiceResult<Vec<Activity>> {
        let classes: HashMap<Uuid, String> = classes::Entity::find()
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .all(db)
            .await?
            .into_iter()
            .map(|class| (class.id, class.name))
            .collect();
        let class_ids: Vec<Uuid> = classes.keys().copied().collect();

        let submissions = assignment_submissions::Entity::find()
            .find_also_related(assignments::Entity)
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .order_by_desc(assignment_submissions::Column::SubmissionDate)
            .limit(ACTIVITIES_PER_KIND)
            .all(db)
            .await?;
        let marks = attendance::Entity::find()
            .filter(attendance::Column::ClassId.is_in(class_ids.clone()))
            .order_by_desc(attendance::Column::CreatedAt)
            .limit(ACTIVITIES_PER_KIND)
            .all(db)
            .await?;
        let grades = grades::Entity::find()
            .filter(grades::Column::ClassId.is_in(class_ids))
            .order_by_desc(grades::Column::UpdatedAt)
            .limit(ACTIVITIES_PER_KIND)
            .all(db)
            .await?;

        let mut student_ids: Vec<Uuid> = submissions.iter().map(|(s, _)| s.student_id).collect();
        student_ids.extend(marks.iter().map(|m| m.student_id));
        student_ids.extend(grades.iter().map(|g| g.student_id));
        let names = user_names(db, student_ids).await?;
        let name = |id: &Uuid| names.get(id).cloned().unwrap_or_else(|| "Unknown".to_string());

        let grade_assignments: Vec<Uuid> = grades.iter().filter_map(|g| g.assignment_id).collect();
        let titles: HashMap<Uuid, String> = if grade_assignments.is_empty() {
            HashMap::new()
        } else {
            assignments::Entity::find()
                .filter(assignments::Column::Id.is_in(grade_assignments))
                .all(db)
                .await?
                .into_iter()
                .map(|a| (a.id, a.title))
                .collect()
        };
        let class_name = |id: &Uuid| classes.get(id).cloned().unwrap_or_default();

        let submitted = submissions
            .into_iter()
            .filter_map(|(submission, assignment)| {
                let assignment = assignment?;
                Some(Activity {
                    id: submission.id,
                    kind: ActivityKind::Submission,
                    title: format!("{} submitted {}", name(&submission.student_id), assignment.title),
                    class_name: class_name(&assignment.class_id),
                    timestamp: submission.submission_date,
                })
            })
            .collect();
        let marked = marks
            .into_iter()
            .map(|mark| Activity {
                id: mark.id,
                kind: ActivityKind::Attendance,
                title: format!(
                    "Marked {} as {} in {}",
                    name(&mark.student_id),
                    mark.status,
                    class_name(&mark.class_id)
                ),
                class_name: class_name(&mark.class_id),
                timestamp: mark.created_at,
            })
            .collect();
        let graded = grades
            .into_iter()
            .map(|grade| {
                let subject = grade
                    .assignment_id
                    .and_then(|id| titles.get(&id).cloned())
                    .unwrap_or_else(|| class_name(&grade.class_id));
                Activity {
                    id: grade.id,
                    kind: ActivityKind::Grade,
                    title: format!("Graded {}'s {subject}", name(&grade.student_id)),
                    class_name: class_name(&grade.class_id),
                    timestamp: grade.updated_at,
                }
            })
            .collect();

        Ok(merge_activities(vec![submitted, marked, graded], ACTIVITY_LIMIT))
    }

    pub async fn teacher_classes(
        db: &DatabaseConnection,
        teacher_id: Uuid,
    ) -> ServiceResult<Vec<TeacherClass>> {
        let classes = classes::Entity::find()
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .filter(classes::Column::Status.eq(ClassStatus::Active))
            .order_by_asc(classes::Column::Name)
            .all(db)
            .await?;
        let counts =
            ClassService::active_counts(db, classes.iter().map(|c| c.id).collect()).await?;

        let mut result = Vec::with_capacity(classes.len());
        for class in classes {
            let recent_assignments = assignments::Entity::find()
                .filter(assignments::Column::ClassId.eq(class.id))
                .filter(assignments::Column::Status.eq(AssignmentStatus::Active))
                .order_by_desc(assignments::Column::DueDate)
                .limit(RECENT_ASSIGNMENTS)
                .all(db)
                .await?;

            result.push(TeacherClass {
                students_count: counts.get(&class.id).copied().unwrap_or(0),
                recent_assignments,
                class,
            });
        }

        Ok(result)
    }

    /// A teacher's class with its active roster, hidden when owned by someone else
    pub async fn teacher_class(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
    ) -> ServiceResult<ClassDetail> {
        ClassService::owned(db, class_id, teacher_id).await?;
        ClassService::get(db, class_id).await
    }

    pub async fn teacher_schedule(
        db: &DatabaseConnection,
        teacher_id: Uuid,
    ) -> ServiceResult<Vec<TeacherScheduleEntry>> {
        let classes = classes::Entity::find()
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .filter(classes::Column::Status.eq(ClassStatus::Active))
            .order_by_asc(classes::Column::Name)
            .all(db)
            .await?;

        let mut entries: Vec<TeacherScheduleEntry> = classes
            .iter()
            .flat_map(|class| {
                parse_schedule(class).into_iter().flat_map(move |schedule| {
                    schedule
                        .slots()
                        .map(|slot| TeacherScheduleEntry {
                            day: slot.day,
                            time: slot.time,
                            class_id: class.id,
                            class_name: class.name.clone(),
                            room: class.room.clone(),
                            grade: class.grade.clone(),
                            section: class.section.clone(),
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        entries.sort_by_key(|entry| (day_index(entry.day), entry.time.map(|t| t.begin)));

        Ok(entries)
    }

    pub async fn student_classes(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> ServiceResult<Vec<StudentClass>> {
        let classes = RosterService::student_classes(db, student_id).await?;
        let teachers = user_names(db, classes.iter().map(|c| c.teacher_id).collect()).await?;

        Ok(classes
            .into_iter()
            .map(|class| StudentClass {
                teacher_name: teachers.get(&class.teacher_id).cloned(),
                class,
            })
            .collect())
    }

    pub async fn student_schedule(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> ServiceResult<Vec<StudentScheduleEntry>> {
        let classes = RosterService::student_classes(db, student_id).await?;
        let teachers = user_names(db, classes.iter().map(|c| c.teacher_id).collect()).await?;

        let mut entries: Vec<StudentScheduleEntry> = classes
            .iter()
            .flat_map(|class| {
                let teacher_name = teachers.get(&class.teacher_id).cloned();
                parse_schedule(class).into_iter().flat_map(move |schedule| {
                    schedule
                        .slots()
                        .map(|slot| StudentScheduleEntry {
                            class_id: class.id,
                            subject: class.name.clone(),
                            teacher_name: teacher_name.clone(),
                            room: class.room.clone(),
                            day: slot.day,
                            time: slot.time,
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        entries.sort_by_key(|entry| (day_index(entry.day), entry.time.map(|t| t.begin)));

        Ok(entries)
    }
}

/// Merges activity groups, newest first, keeping at most `limit`
pub fn merge_activities(groups: Vec<Vec<Activity>>, limit: usize) -> Vec<Activity> {
    let mut merged: Vec<Activity> = groups.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(limit);
    merged
}

/// `part / total` as a percentage with one decimal, 0 when `total` is 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Mean with one decimal, 0 when empty
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round1(values.iter().sum::<f64>() / values.len() as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn day_index(day: &str) -> u32 {
    day.parse::<Weekday>()
        .map(|weekday| weekday.num_days_from_monday())
        .unwrap_or(7)
}

fn parse_schedule(class: &classes::Model) -> Option<ClassSchedule> {
    let schedule: ClassSchedule = class.schedule.as_deref()?.parse().ok()?;
    (!schedule.days.is_empty()).then_some(schedule)
}

async fn active_class_ids<C: ConnectionTrait>(db: &C, teacher_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
    classes::Entity::find()
        .select_only()
        .column(classes::Column::Id)
        .filter(classes::Column::TeacherId.eq(teacher_id))
        .filter(classes::Column::Status.eq(ClassStatus::Active))
        .into_tuple()
        .all(db)
        .await
}

/// Scored grades and the total number of grades in the classes
async fn class_scores<C: ConnectionTrait>(
    db: &C,
    class_ids: Vec<Uuid>,
) -> Result<(Vec<f64>, u64), DbErr> {
    let scores: Vec<Option<f64>> = grades::Entity::find()
        .select_only()
        .column(grades::Column::Score)
        .filter(grades::Column::ClassId.is_in(class_ids))
        .into_tuple()
        .all(db)
        .await?;
    let total = scores.len() as u64;

    Ok((scores.into_iter().flatten().collect(), total))
}

async fn user_names<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user.full_name))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn activity(kind: ActivityKind, minute: u32) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            kind,
            title: String::new(),
            class_name: String::new(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_merge_activities_sorts_and_truncates() {
        let submissions = (0..5).map(|m| activity(ActivityKind::Submission, m)).collect();
        let attendance = (10..15).map(|m| activity(ActivityKind::Attendance, m)).collect();
        let grades = (20..25).map(|m| activity(ActivityKind::Grade, m)).collect();

        let merged = merge_activities(vec![submissions, attendance, grades], 10);

        assert_eq!(merged.len(), 10);
        assert!(merged.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(merged[0].kind, ActivityKind::Grade);
        assert!(merged.iter().all(|a| a.kind != ActivityKind::Submission));
    }

    #[test]
    fn test_percentage_and_average() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[85.0, 90.0, 70.5]), 81.8);
    }

    #[test]
    fn test_day_index_orders_week() {
        assert_eq!(day_index("Monday"), 0);
        assert_eq!(day_index("Sunday"), 6);
        assert_eq!(day_index("Someday"), 7);
    }
}
