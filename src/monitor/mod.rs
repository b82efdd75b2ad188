pub mod diff;
pub mod checker;
pub mod watcher;

pub use diff::{find_new_pending, find_newest_transactions, INITIAL_HISTORY_BATCH, HISTORY_BATCH_STEP};
pub use checker::{AccountChecker, Senders};
pub use watcher::{PollSummary, Watcher};
