use crate::m20250801_create_all_tables::{
    AssignmentSubmissions, Assignments, Attendance, ClassEnrollments, Classes, Grades,
    StudentProfiles, Users,
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        // Promotion looks students up by grade and section
        manager
            .create_index(
                Index::create()
                    .name("idx_student_profiles_grade_section")
                    .table(StudentProfiles::Table)
                    .col(StudentProfiles::Grade)
                    .col(StudentProfiles::Section)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classes_teacher_id")
                    .table(Classes::Table)
                    .col(Classes::TeacherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classes_grade_section")
                    .table(Classes::Table)
                    .col(Classes::Grade)
                    .col(Classes::Section)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_enrollments_class_status")
                    .table(ClassEnrollments::Table)
                    .col(ClassEnrollments::ClassId)
                    .col(ClassEnrollments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_enrollments_student_id")
                    .table(ClassEnrollments::Table)
                    .col(ClassEnrollments::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assignments_class_id")
                    .table(Assignments::Table)
                    .col(Assignments::ClassId)
                    .to_owned(),
            )
            .await?;

        // One submission per student per assignment
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_submissions_assignment_student")
                    .table(AssignmentSubmissions::Table)
                    .col(AssignmentSubmissions::AssignmentId)
                    .col(AssignmentSubmissions::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grades_class_assignment_student")
                    .table(Grades::Table)
                    .col(Grades::ClassId)
                    .col(Grades::AssignmentId)
                    .col(Grades::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_class_date")
                    .table(Attendance::Table)
                    .col(Attendance::ClassId)
                    .col(Attendance::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx_users_role", Users::Table.into_iden()),
            (
                "idx_student_profiles_grade_section",
                StudentProfiles::Table.into_iden(),
            ),
            ("idx_classes_teacher_id", Classes::Table.into_iden()),
            ("idx_classes_grade_section", Classes::Table.into_iden()),
            (
                "idx_class_enrollments_class_status",
                ClassEnrollments::Table.into_iden(),
            ),
            (
                "idx_class_enrollments_student_id",
                ClassEnrollments::Table.into_iden(),
            ),
            ("idx_assignments_class_id", Assignments::Table.into_iden()),
            (
                "idx_assignment_submissions_assignment_student",
                AssignmentSubmissions::Table.into_iden(),
            ),
            (
                "idx_grades_class_assignment_student",
                Grades::Table.into_iden(),
            ),
            ("idx_attendance_class_date", Attendance::Table.into_iden()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}
