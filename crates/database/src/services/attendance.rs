use crate::{
    entities::{attendance, classes},
    error::{ServiceError, ServiceResult},
    services::{classes::ClassService, roster::RosterService},
};
use chrono::{NaiveDate, Utc};
use log::info;
use models::status::AttendanceStatus;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub record: attendance::Model,
    pub student_name: String,
}

#[derive(Debug, Clone)]
pub struct StudentAttendance {
    pub record: attendance::Model,
    pub class_name: String,
}

pub struct AttendanceService;

impl AttendanceService {
    /// Attendance of a class on `date`. Enrolled students without a record get an `absent` one.
    pub async fn for_date(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        date: NaiveDate,
    ) -> ServiceResult<Vec<AttendanceRow>> {
        let txn = db.begin().await?;

        ClassService::owned(&txn, class_id, teacher_id).await?;
        let students = RosterService::class_students(&txn, class_id).await?;

        let mut existing: HashMap<Uuid, attendance::Model> = attendance::Entity::find()
            .filter(attendance::Column::ClassId.eq(class_id))
            .filter(attendance::Column::Date.eq(date))
            .all(&txn)
            .await?
            .into_iter()
            .map(|record| (record.student_id, record))
            .collect();

        let mut rows = Vec::with_capacity(students.len());
        for enrolled in students {
            let student = enrolled.student.account;
            let record = match existing.remove(&student.id) {
                Some(record) => record,
                None => {
                    insert(&txn, class_id, student.id, date, AttendanceStatus::Absent, None).await?
                }
            };
            rows.push(AttendanceRow {
                record,
                student_name: student.full_name,
            });
        }

        txn.commit().await?;
        Ok(rows)
    }

    /// Records attendance for several students on one date, replacing earlier marks
    pub async fn mark(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        date: NaiveDate,
        entries: Vec<AttendanceEntry>,
    ) -> ServiceResult<Vec<attendance::Model>> {
        if entries.is_empty() {
            return Err(ServiceError::validation("attendance must not be empty"));
        }

        let txn = db.begin().await?;

        let class = ClassService::owned(&txn, class_id, teacher_id).await?;

        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            if RosterService::active_enrollment(&txn, class_id, entry.student_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::NotFound("enrollment"));
            }

            let existing = attendance::Entity::find()
                .filter(attendance::Column::ClassId.eq(class_id))
                .filter(attendance::Column::StudentId.eq(entry.student_id))
                .filter(attendance::Column::Date.eq(date))
                .one(&txn)
                .await?;

            let record = match existing {
                Some(record) => {
                    let mut active: attendance::ActiveModel = record.into();
                    active.status = Set(entry.status);
                    active.notes = Set(entry.notes);
                    active.update(&txn).await?
                }
                None => {
                    insert(&txn, class_id, entry.student_id, date, entry.status, entry.notes)
                        .await?
                }
            };
            saved.push(record);
        }

        txn.commit().await?;
        info!(
            "Marked attendance for {} students in {} on {date}",
            saved.len(),
            class.name
        );

        Ok(saved)
    }

    pub async fn update(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        attendance_id: Uuid,
        status: Option<AttendanceStatus>,
        notes: Option<String>,
    ) -> ServiceResult<attendance::Model> {
        let record = attendance::Entity::find_by_id(attendance_id)
            .inner_join(classes::Entity)
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("attendance record"))?;

        let mut active: attendance::ActiveModel = record.into();
        if let Some(status) = status {
            active.status = Set(status);
        }
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }

        Ok(active.update(db).await?)
    }

    /// A student's attendance within an inclusive date range, newest first
    pub async fn student_attendance(
        db: &DatabaseConnection,
        student_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        class_id: Option<Uuid>,
    ) -> ServiceResult<Vec<StudentAttendance>> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ServiceError::validation("start_date must not be after end_date"));
            }
        }

        let mut query = attendance::Entity::find()
            .filter(attendance::Column::StudentId.eq(student_id))
            .order_by_desc(attendance::Column::Date);
        if let Some(start) = start_date {
            query = query.filter(attendance::Column::Date.gte(start));
        }
        if let Some(end) = end_date {
            query = query.filter(attendance::Column::Date.lte(end));
        }
        if let Some(class_id) = class_id {
            query = query.filter(attendance::Column::ClassId.eq(class_id));
        }

        Ok(query
            .find_also_related(classes::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(record, class)| StudentAttendance {
                class_name: class.map(|c| c.name).unwrap_or_default(),
                record,
            })
            .collect())
    }
}

async fn insert<C: ConnectionTrait>(
    db: &C,
    class_id: Uuid,
    student_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<attendance::Model, DbErr> {
    attendance::ActiveModel {
        id: Set(Uuid::new_v4()),
        class_id: Set(class_id),
        student_id: Set(student_id),
        date: Set(date),
        status: Set(status),
        notes: Set(notes),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}
