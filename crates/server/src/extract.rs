use crate::{error::ApiError, state::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    extract::Cached,
    headers::{Authorization, authorization::Bearer},
};
use database::{ServiceError, entities::users, services::users::UserService};
use models::Role;
use std::{marker::PhantomData, ops::Deref};

/// The account behind the bearer token of the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub users::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

        let claims = state
            .tokens
            .verify(bearer.token())
            .map_err(|_| ApiError::unauthorized("Could not validate credentials"))?;

        let account = UserService::find_by_email(&state.db, &claims.sub)
            .await
            .map_err(ServiceError::from)?
            .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

        if !account.is_active {
            return Err(ApiError::Forbidden("Inactive user".to_string()));
        }

        Ok(Self(account))
    }
}

/// Fails with `Forbidden` unless `account` has `role`
pub fn require_role(account: &users::Model, role: Role) -> Result<(), ApiError> {
    if account.role == role {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("{role} access required")))
    }
}

pub trait RequiredRole {
    const ROLE: Role;
}

#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[derive(Debug, Clone, Copy)]
pub struct Teacher;

#[derive(Debug, Clone, Copy)]
pub struct Student;

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

impl RequiredRole for Teacher {
    const ROLE: Role = Role::Teacher;
}

impl RequiredRole for Student {
    const ROLE: Role = Role::Student;
}

/// An authenticated account holding role `R`
#[derive(Debug, Clone)]
pub struct Authorized<R> {
    pub account: users::Model,
    role: PhantomData<R>,
}

pub type AdminUser = Authorized<Admin>;
pub type TeacherUser = Authorized<Teacher>;
pub type StudentUser = Authorized<Student>;

impl<R> Deref for Authorized<R> {
    type Target = users::Model;

    fn deref(&self) -> &Self::Target {
        &self.account
    }
}

impl<R> FromRequestParts<AppState> for Authorized<R>
where
    R: RequiredRole + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = Cached::<CurrentUser>::from_request_parts(parts, state).await?.0;
        require_role(&account, R::ROLE)?;

        Ok(Self {
            account,
            role: PhantomData,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn account(role: Role) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            email: "someone@school.test".to_string(),
            full_name: "Someone".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
            contact: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&account(Role::Teacher), Role::Teacher).is_ok());

        let err = require_role(&account(Role::Student), Role::Admin).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(err.to_string(), "admin access required");
    }
}
