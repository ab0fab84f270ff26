pub mod assignment_submissions;
pub mod assignments;
pub mod attendance;
pub mod class_enrollments;
pub mod classes;
pub mod grades;
pub mod student_profiles;
pub mod teacher_profiles;
pub mod users;
