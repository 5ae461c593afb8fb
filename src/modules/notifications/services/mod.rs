pub mod notification_dispatcher;
pub mod notification_sender;

pub use notification_dispatcher::NotificationDispatcher;
pub use notification_sender::{LogNotificationSender, NotificationSender};
