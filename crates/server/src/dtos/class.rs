use chrono::{DateTime, NaiveDate, Utc};
use database::{
    entities::{assignments, class_enrollments},
    services::{
        classes::{ClassChanges, ClassDetail, NewClass},
        reports::{StudentClass, TeacherClass},
        roster::EnrolledStudent,
        users::UserWithProfile,
    },
};
use models::{
    Role,
    status::{AssignmentStatus, ClassStatus, EnrollmentStatus},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassCreate {
    pub name: String,
    pub grade: String,
    pub section: String,
    pub subject: String,
    pub teacher_id: Uuid,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    /// e.g. `Mon, Wed 09:00-10:30`
    pub schedule: Option<String>,
    pub room: Option<String>,
    #[serde(default)]
    pub status: ClassStatus,
}

fn default_capacity() -> i32 {
    30
}

impl From<ClassCreate> for NewClass {
    fn from(create: ClassCreate) -> Self {
        Self {
            name: create.name,
            grade: create.grade,
            section: create.section,
            subject: create.subject,
            teacher_id: create.teacher_id,
            capacity: create.capacity,
            schedule: create.schedule,
            room: create.room,
            status: create.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassUpdate {
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

impl From<ClassUpdate> for ClassChanges {
    fn from(update: ClassUpdate) -> Self {
        Self {
            name: update.name,
            grade: update.grade,
            section: update.section,
            subject: update.subject,
            teacher_id: update.teacher_id,
            capacity: update.capacity,
            schedule: update.schedule,
            room: update.room,
            status: update.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrolledStudentResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub grade: Option<String>,
    pub section: Option<String>,
}

impl From<UserWithProfile> for EnrolledStudentResponse {
    fn from(user: UserWithProfile) -> Self {
        let (grade, section) = user
            .student()
            .map(|s| (s.grade.clone(), s.section.clone()))
            .unwrap_or_default();

        Self {
            id: user.account.id,
            email: user.account.email,
            full_name: user.account.full_name,
            role: user.account.role,
            grade,
            section,
        }
    }
}

impl From<EnrolledStudent> for EnrolledStudentResponse {
    fn from(enrolled: EnrolledStudent) -> Self {
        enrolled.student.into()
    }
}

/// A class with its teacher and active roster; `current_students` counts active enrollments
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassResponse {
    pub id: Uuid,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub subject: String,
    pub teacher_id: Uuid,
    pub teacher_name: Option<String>,
    pub teacher_email: Option<String>,
    pub capacity: i32,
    pub current_students: u64,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub status: ClassStatus,
    pub enrolled_students: Vec<EnrolledStudentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClassDetail> for ClassResponse {
    fn from(detail: ClassDetail) -> Self {
        let current_students = detail.current_students();
        let class = detail.class;
        let (teacher_name, teacher_email) = detail
            .teacher
            .map(|t| (Some(t.account.full_name), Some(t.account.email)))
            .unwrap_or_default();

        Self {
            id: class.id,
            name: class.name,
            grade: class.grade,
            section: class.section,
            subject: class.subject,
            teacher_id: class.teacher_id,
            teacher_name,
            teacher_email,
            capacity: class.capacity,
            current_students,
            schedule: class.schedule,
            room: class.room,
            status: class.status,
            enrolled_students: detail.students.into_iter().map(Into::into).collect(),
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentBrief {
    pub id: Uuid,
    pub title: String,
    pub due_date: NaiveDate,
    pub max_score: f64,
    pub status: AssignmentStatus,
}

impl From<assignments::Model> for AssignmentBrief {
    fn from(assignment: assignments::Model) -> Self {
        Self {
            id: assignment.id,
            title: assignment.title,
            due_date: assignment.due_date,
            max_score: assignment.max_score,
            status: assignment.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherClassResponse {
    pub id: Uuid,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub subject: String,
    pub capacity: i32,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub status: ClassStatus,
    pub students_count: u64,
    pub recent_assignments: Vec<AssignmentBrief>,
}

impl From<TeacherClass> for TeacherClassResponse {
    fn from(teacher_class: TeacherClass) -> Self {
        let class = teacher_class.class;
        Self {
            id: class.id,
            name: class.name,
            grade: class.grade,
            section: class.section,
            subject: class.subject,
            capacity: class.capacity,
            schedule: class.schedule,
            room: class.room,
            status: class.status,
            students_count: teacher_class.students_count,
            recent_assignments: teacher_class
                .recent_assignments
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentClassResponse {
    pub id: Uuid,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub subject: String,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub teacher_id: Uuid,
    pub teacher_name: Option<String>,
}

impl From<StudentClass> for StudentClassResponse {
    fn from(student_class: StudentClass) -> Self {
        let class = student_class.class;
        Self {
            id: class.id,
            name: class.name,
            grade: class.grade,
            section: class.section,
            subject: class.subject,
            schedule: class.schedule,
            room: class.room,
            teacher_id: class.teacher_id,
            teacher_name: student_class.teacher_name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollmentRequest {
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
}

impl From<class_enrollments::Model> for EnrollmentResponse {
    fn from(enrollment: class_enrollments::Model) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            class_id: enrollment.class_id,
            status: enrollment.status,
            enrollment_date: enrollment.enrollment_date,
        }
    }
}
