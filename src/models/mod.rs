pub mod transaction;
pub mod amount;

pub use transaction::{Transaction, TransactionKind, PendingTransfer, PendingMap};
pub use amount::{raw_to_display, format_nano, RAW_PER_XRB};
