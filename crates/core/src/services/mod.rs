//! Core services.

pub mod assignment;
pub mod comment;
pub mod message;
pub mod notification;
pub mod report;

pub use assignment::{CategoryRoleResolver, StaffLoadBalancer};
pub use comment::InternalCommentService;
pub use message::MessageService;
pub use notification::NotificationService;
pub use report::{
    CreateReportInput, MAX_PHOTOS, MIN_PHOTOS, MapData, MapQuery, ReportDetail, ReportService,
};
