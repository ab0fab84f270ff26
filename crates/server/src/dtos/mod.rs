pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod class;
pub mod grade;
pub mod report;
pub mod user;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
