use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::Contact).string())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create student_profiles table (one row per student account)
        manager
            .create_table(
                Table::create()
                    .table(StudentProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentProfiles::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudentProfiles::Grade).string())
                    .col(ColumnDef::new(StudentProfiles::Section).string())
                    .col(ColumnDef::new(StudentProfiles::ParentId).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_profiles-user_id")
                            .from(StudentProfiles::Table, StudentProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_profiles-parent_id")
                            .from(StudentProfiles::Table, StudentProfiles::ParentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create teacher_profiles table (one row per teacher account)
        manager
            .create_table(
                Table::create()
                    .table(TeacherProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherProfiles::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeacherProfiles::Subject).string())
                    .col(ColumnDef::new(TeacherProfiles::Qualification).string())
                    .col(ColumnDef::new(TeacherProfiles::Bio).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-teacher_profiles-user_id")
                            .from(TeacherProfiles::Table, TeacherProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create classes table
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Classes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Classes::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Classes::Grade).string().not_null())
                    .col(ColumnDef::new(Classes::Section).string().not_null())
                    .col(ColumnDef::new(Classes::Subject).string().not_null())
                    .col(ColumnDef::new(Classes::TeacherId).uuid().not_null())
                    .col(ColumnDef::new(Classes::Capacity).integer().not_null())
                    .col(ColumnDef::new(Classes::Schedule).string())
                    .col(ColumnDef::new(Classes::Room).string())
                    .col(ColumnDef::new(Classes::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Classes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classes-teacher_id")
                            .from(Classes::Table, Classes::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create class_enrollments table
        manager
            .create_table(
                Table::create()
                    .table(ClassEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClassEnrollments::StudentId).uuid().not_null())
                    .col(ColumnDef::new(ClassEnrollments::ClassId).uuid().not_null())
                    .col(
                        ColumnDef::new(ClassEnrollments::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassEnrollments::EnrollmentDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_enrollments-student_id")
                            .from(ClassEnrollments::Table, ClassEnrollments::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_enrollments-class_id")
                            .from(ClassEnrollments::Table, ClassEnrollments::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create assignments table
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).text())
                    .col(ColumnDef::new(Assignments::ClassId).uuid().not_null())
                    .col(ColumnDef::new(Assignments::TeacherId).uuid().not_null())
                    .col(ColumnDef::new(Assignments::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Assignments::MaxScore)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(ColumnDef::new(Assignments::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-assignments-class_id")
                            .from(Assignments::Table, Assignments::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-assignments-teacher_id")
                            .from(Assignments::Table, Assignments::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create assignment_submissions table
        manager
            .create_table(
                Table::create()
                    .table(AssignmentSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentSubmissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AssignmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::StudentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentSubmissions::Content).text())
                    .col(ColumnDef::new(AssignmentSubmissions::FilePath).string())
                    .col(
                        ColumnDef::new(AssignmentSubmissions::SubmissionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentSubmissions::Feedback).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-assignment_submissions-assignment_id")
                            .from(
                                AssignmentSubmissions::Table,
                                AssignmentSubmissions::AssignmentId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-assignment_submissions-student_id")
                            .from(
                                AssignmentSubmissions::Table,
                                AssignmentSubmissions::StudentId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create grades table
        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Grades::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Grades::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Grades::ClassId).uuid().not_null())
                    .col(ColumnDef::new(Grades::AssignmentId).uuid())
                    .col(ColumnDef::new(Grades::SubmissionId).uuid())
                    .col(ColumnDef::new(Grades::Score).double())
                    .col(
                        ColumnDef::new(Grades::MaxScore)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(ColumnDef::new(Grades::GradeType).string().not_null())
                    .col(
                        ColumnDef::new(Grades::Weight)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(ColumnDef::new(Grades::RubricData).json())
                    .col(ColumnDef::new(Grades::Comment).text())
                    .col(ColumnDef::new(Grades::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Grades::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Grades::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-grades-student_id")
                            .from(Grades::Table, Grades::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-grades-class_id")
                            .from(Grades::Table, Grades::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-grades-assignment_id")
                            .from(Grades::Table, Grades::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-grades-submission_id")
                            .from(Grades::Table, Grades::SubmissionId)
                            .to(AssignmentSubmissions::Table, AssignmentSubmissions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create attendance table
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendance::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendance::ClassId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(ColumnDef::new(Attendance::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Attendance::Notes).text())
                    .col(
                        ColumnDef::new(Attendance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attendance-class_id")
                            .from(Attendance::Table, Attendance::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attendance-student_id")
                            .from(Attendance::Table, Attendance::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Grades::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AssignmentSubmissions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClassEnrollments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeacherProfiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(StudentProfiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Users {
    Table,
    Id,
    Email,
    FullName,
    PasswordHash,
    Role,
    IsActive,
    Contact,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum StudentProfiles {
    Table,
    UserId,
    Grade,
    Section,
    ParentId,
}

#[derive(Iden)]
enum TeacherProfiles {
    Table,
    UserId,
    Subject,
    Qualification,
    Bio,
}

#[derive(Iden)]
pub(crate) enum Classes {
    Table,
    Id,
    Name,
    Grade,
    Section,
    Subject,
    TeacherId,
    Capacity,
    Schedule,
    Room,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum ClassEnrollments {
    Table,
    Id,
    StudentId,
    ClassId,
    Status,
    EnrollmentDate,
}

#[derive(Iden)]
pub(crate) enum Assignments {
    Table,
    Id,
    Title,
    Description,
    ClassId,
    TeacherId,
    DueDate,
    MaxScore,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum AssignmentSubmissions {
    Table,
    Id,
    AssignmentId,
    StudentId,
    Content,
    FilePath,
    SubmissionDate,
    Status,
    Feedback,
}

#[derive(Iden)]
pub(crate) enum Grades {
    Table,
    Id,
    StudentId,
    ClassId,
    AssignmentId,
    SubmissionId,
    Score,
    MaxScore,
    GradeType,
    Weight,
    RubricData,
    Comment,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum Attendance {
    Table,
    Id,
    ClassId,
    StudentId,
    Date,
    Status,
    Notes,
    CreatedAt,
}
