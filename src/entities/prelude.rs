pub use super::microposts::Entity as Microposts;
pub use super::relationships::Entity as Relationships;
pub use super::users::Entity as Users;
