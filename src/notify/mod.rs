pub mod message;
pub mod mailer;

pub use message::{build_transaction_message, build_pending_message, Message, MessageEntry, Template};
pub use mailer::{Email, Mailer, Notifier, RelayMailer};
