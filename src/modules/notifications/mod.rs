// Notifications module
//
// Invoice and receipt emails are rendered elsewhere; the pipeline only
// decides when to send and never waits for the result.

pub mod services;

pub use services::{LogNotificationSender, NotificationDispatcher, NotificationSender};
