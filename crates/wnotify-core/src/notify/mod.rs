//! Notification channels (SMS and email placeholders today, webhook for real delivery).

pub mod channels;
pub mod port;
pub mod webhook;

pub use channels::{EmailSender, SmsSender};
pub use port::Sender;
pub use webhook::WebhookSender;
