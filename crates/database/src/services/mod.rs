pub mod assignments;
pub mod attendance;
pub mod classes;
pub mod credentials;
pub mod files;
pub mod grades;
pub mod reports;
pub mod roster;
pub mod users;
