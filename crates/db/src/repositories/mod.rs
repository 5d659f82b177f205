//! Database repositories.

pub mod category_role;
pub mod comment;
pub mod company;
pub mod message;
pub mod notification;
pub mod photo;
pub mod report;
pub mod user;

pub use category_role::CategoryRoleRepository;
pub use comment::InternalCommentRepository;
pub use company::CompanyRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use photo::PhotoRepository;
pub use report::{MapReportRecord, ReportCluster, ReportRepository};
pub use user::{UserRepository, UserWithRoles};
