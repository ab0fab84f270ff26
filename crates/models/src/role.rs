use sea_orm::{ActiveEnum, Iterable, entity::prelude::*};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Returned when a string does not name any variant of a stored enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Case-insensitive lookup over the stored string values of an enum
pub(crate) fn parse_stored<E>(kind: &'static str, value: &str) -> Result<E, ParseEnumError>
where
    E: ActiveEnum<Value = String> + Iterable,
{
    let trimmed = value.trim();
    E::iter()
        .find(|variant| variant.to_value().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| ParseEnumError {
            kind,
            value: value.to_string(),
        })
}

/// Implements `FromStr` and `Display` in terms of the stored string value
macro_rules! stored_string_enum {
    ($ty:ty, $kind:literal) => {
        impl std::str::FromStr for $ty {
            type Err = $crate::role::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::role::parse_stored($kind, s)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&sea_orm::ActiveEnum::to_value(self))
            }
        }
    };
}

pub(crate) use stored_string_enum;

/// The role of an account. Fixed at creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "parent")]
    Parent,
}

stored_string_enum!(Role, "role");

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_parse_ignores_case() {
        assert_eq!(Role::from_str("Teacher").unwrap(), Role::Teacher);
        assert_eq!(Role::from_str(" student ").unwrap(), Role::Student);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        let err = Role::from_str("janitor").unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "janitor");
    }

    #[test]
    fn test_role_display_matches_stored_value() {
        assert_eq!(Role::Parent.to_string(), "parent");
        assert_eq!(
            serde_json::to_string(&Role::Parent).unwrap(),
            "\"parent\""
        );
    }
}
