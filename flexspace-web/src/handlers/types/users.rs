//! User endpoint payloads

use flexspace_core::{Page, UserProfile, UserRole};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Admin user listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserPageResponse {
    pub data: Vec<UserProfile>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl From<Page<UserProfile>> for UserPageResponse {
    fn from(page: Page<UserProfile>) -> Self {
        Self {
            data: page.data,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
