use serde_json::json;

use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{format_nano, PendingMap};
use crate::monitor::diff::{find_new_pending, find_newest_transactions, INITIAL_HISTORY_BATCH};
use crate::node::NodeRpc;
use crate::notify::{build_pending_message, build_transaction_message, Notifier};

/// Sender addresses used for the two kinds of notification
#[derive(Debug, Clone)]
pub struct Senders {
    pub received: String,
    pub pending: String,
}

/// Runs fetch, diff, build and notify for a single account.
///
/// Holds no account state of its own: callers pass in the last known state
/// and keep whatever comes back.
pub struct AccountChecker {
    rpc: Box<dyn NodeRpc>,
    notifier: Notifier,
    senders: Senders,
    max_history_batch: u32,
}

impl AccountChecker {
    pub fn new(rpc: Box<dyn NodeRpc>, notifier: Notifier, senders: Senders, max_history_batch: u32) -> Self {
        Self {
            rpc,
            notifier,
            senders,
            max_history_batch,
        }
    }

    pub fn from_config(rpc: Box<dyn NodeRpc>, notifier: Notifier, config: &AppConfig) -> Self {
        let senders = Senders {
            received: config.email.received_from.clone(),
            pending: config.email.pending_from.clone(),
        };
        Self::new(rpc, notifier, senders, config.node.max_history_batch)
    }

    /// Look for confirmed transactions newer than `last_known_hash` and report the receives.
    ///
    /// Without a prior hash this only establishes a baseline: the newest hash is
    /// returned (or `None` for an account with no history) and nobody is notified.
    /// Otherwise returns the newest hash seen, or `last_known_hash` unchanged when
    /// nothing is new.
    pub async fn check_account_for_new_transactions(
        &self,
        account: &str,
        last_known_hash: Option<&str>,
        emails: &[String],
    ) -> Result<Option<String>> {
        let context = LogContext::new("checker", "transactions").with_account(account);
        context.info("Finding new transactions");

        let last_known_hash = match last_known_hash {
            Some(hash) => hash,
            None => {
                context.debug("No known transactions, establishing baseline");
                let history = self.rpc.account_history(account, INITIAL_HISTORY_BATCH).await?;
                return Ok(history.first().map(|tx| tx.hash.clone()));
            }
        };

        let new_transactions = find_newest_transactions(
            self.rpc.as_ref(),
            account,
            last_known_hash,
            INITIAL_HISTORY_BATCH,
            self.max_history_batch,
        )
        .await?;

        context
            .with_metadata("new_transactions", json!(new_transactions.len()))
            .debug(&format!("Found {} new transactions", new_transactions.len()));

        let message = build_transaction_message(account, &new_transactions)?;
        if !message.is_empty() {
            let total = format_nano(message.total);
            let subject = format!("Received {} XRB from {}", total, account);
            self.notifier
                .notify(emails, &message.body, &subject, &self.senders.received)
                .await?;
            MetricsLogger::log_notification_sent(account, &subject, emails.len(), &total);
        }

        Ok(match new_transactions.first() {
            Some(newest) => Some(newest.hash.clone()),
            None => Some(last_known_hash.to_string()),
        })
    }

    /// Look for pending transfers not in `last_known_pending` and report them.
    ///
    /// An empty `last_known_pending` makes every current pending transfer new, so
    /// the first run notifies about all of them. The full current pending map is
    /// returned as the next last known state.
    pub async fn check_account_for_new_pending(
        &self,
        account: &str,
        last_known_pending: &PendingMap,
        emails: &[String],
    ) -> Result<PendingMap> {
        let context = LogContext::new("checker", "pending").with_account(account);
        context.info("Finding pending transactions");

        let pending = self.rpc.pending(account).await?;

        let message = if last_known_pending.is_empty() {
            context.debug("No known pending transactions, every pending transfer is new");
            build_pending_message(account, &pending)?
        } else {
            let new_pending = find_new_pending(&pending, last_known_pending);
            build_pending_message(account, &new_pending)?
        };

        if message.total != 0.0 {
            let total = format_nano(message.total);
            let subject = format!("Pending {} XRB from {}", total, account);
            self.notifier
                .notify(emails, &message.body, &subject, &self.senders.pending)
                .await?;
            MetricsLogger::log_notification_sent(account, &subject, emails.len(), &total);
        }

        Ok(pending)
    }
}
