use serde::Serialize;

use crate::db::User;
use crate::entities::microposts;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MicropostDto {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: String,
}

impl From<microposts::Model> for MicropostDto {
    fn from(post: microposts::Model) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            content: post.content,
            created_at: post.created_at,
        }
    }
}

/// A user's profile page: identity, graph counts, and one page of posts.
#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub micropost_count: u64,
    pub following_count: u64,
    pub followers_count: u64,
    pub microposts: Vec<MicropostDto>,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct UserPageDto {
    pub users: Vec<UserDto>,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct FeedPageDto {
    pub posts: Vec<MicropostDto>,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
