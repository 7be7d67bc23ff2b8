//! Role-based authorization.
//!
//! Every caller, authenticated or not, answers the same [`Capabilities`]
//! queries. Write decisions are made by [`authorize`], a pure function of the
//! caller's capabilities and the requested [`Action`]. Reads are open to all
//! callers and never consult the policy.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role of a user account. Ordered by privilege.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a caller may attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Create or delete categories and genres; create, update or delete titles.
    ManageCatalog,
    /// List, create, update or delete other users' accounts.
    ManageUsers,
    /// Post reviews and comments, view and edit one's own profile.
    Contribute,
    /// Update or delete an existing review or comment.
    EditContent { author_id: i32 },
}

/// The query interface shared by every caller.
pub trait Capabilities {
    /// `None` for the anonymous caller.
    fn user_id(&self) -> Option<i32>;
    fn is_admin(&self) -> bool;
    fn is_moderator(&self) -> bool;

    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    /// Returns `Ok(())` if the caller may perform `action`.
    fn require(&self, action: Action) -> Result<(), AppError> {
        authorize(self, action)
    }
}

/// Decide whether `caller` may perform `action`.
///
/// Anonymous callers that are refused get `TokenMissing` (401) so clients know
/// to authenticate; authenticated callers get `PermissionDenied` (403).
pub fn authorize<C: Capabilities + ?Sized>(caller: &C, action: Action) -> Result<(), AppError> {
    let allowed = match action {
        Action::ManageCatalog | Action::ManageUsers => caller.is_admin(),
        Action::Contribute => caller.is_authenticated(),
        Action::EditContent { author_id } => {
            caller.user_id() == Some(author_id) || caller.is_moderator() || caller.is_admin()
        }
    };

    if allowed {
        Ok(())
    } else if caller.is_authenticated() {
        Err(AppError::PermissionDenied)
    } else {
        Err(AppError::TokenMissing)
    }
}
