//! Database entities.

pub mod category_role;
pub mod company;
pub mod internal_comment;
pub mod message;
pub mod notification;
pub mod photo;
pub mod report;
pub mod role;
pub mod user;
pub mod user_role;

pub use category_role::Entity as CategoryRole;
pub use company::Entity as Company;
pub use internal_comment::Entity as InternalComment;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use photo::Entity as Photo;
pub use report::Entity as Report;
pub use role::Entity as Role;
pub use user::Entity as User;
pub use user_role::Entity as UserRole;
