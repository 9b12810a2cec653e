pub mod auth_service;
pub mod auth_service_impl;
pub mod error;
pub mod feed_service;
pub mod feed_service_impl;
pub mod user_service;
pub mod user_service_impl;
pub mod validation;

pub use auth_service::{AuthService, SignInResult};
pub use auth_service_impl::SeaOrmAuthService;
pub use error::ServiceError;
pub use feed_service::{FeedPage, FeedService};
pub use feed_service_impl::SeaOrmFeedService;
pub use user_service::{NewUser, ProfileUpdate, UserPage, UserService};
pub use user_service_impl::SeaOrmUserService;
