use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of an account's history as returned by `account_history`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Counterparty account
    pub account: String,
    /// Raw amount string
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Send,
    Receive,
    #[serde(other)]
    Other,
}

impl Transaction {
    pub fn is_receive(&self) -> bool {
        self.kind == TransactionKind::Receive
    }
}

/// A block sent to the account that has not been received yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingTransfer {
    /// Sending account
    pub source: String,
    /// Raw amount string
    pub amount: String,
}

/// Pending transfers keyed by block hash
pub type PendingMap = HashMap<String, PendingTransfer>;
