use models::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth2 password grant form. `username` holds the email.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
    pub grant_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_role: Role,
}
