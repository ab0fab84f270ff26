pub mod profile;
pub mod role;
pub mod schedule;
pub mod status;

pub use profile::{Profile, StudentProfile, TeacherProfile};
pub use role::Role;
