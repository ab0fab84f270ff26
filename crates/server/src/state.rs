use crate::auth::TokenKeys;
use database::services::files::SubmissionFiles;
use sea_orm::DatabaseConnection;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: TokenKeys,
    pub files: SubmissionFiles,
}
