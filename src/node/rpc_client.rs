use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::RpcError;
use crate::logging::{LogContext, PerformanceMonitor, MetricsLogger};
use crate::models::{PendingMap, Transaction};

/// The two node queries the notifier depends on
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Up to `count` history entries for `account`, newest first
    async fn account_history(&self, account: &str, count: u32) -> Result<Vec<Transaction>, RpcError>;

    /// All pending (sent but not yet received) blocks for `account`
    async fn pending(&self, account: &str) -> Result<PendingMap, RpcError>;
}

/// Request body for `account_history`
pub fn account_history_request(account: &str, count: u32) -> Value {
    json!({
        "action": "account_history",
        "account": account,
        "count": count,
    })
}

/// Request body for `pending`, asking the node to include each block's source account
pub fn pending_request(account: &str) -> Value {
    json!({
        "action": "pending",
        "account": account,
        "source": "true",
    })
}

#[derive(Clone)]
pub struct NodeClient {
    client: Client,
    endpoint: String,
}

impl NodeClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, RpcError> {
        let context = LogContext::new("node_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(timeout_seconds));
        context.info("Initializing node RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, action: &str, request: &Value) -> Result<Value, RpcError> {
        LogContext::new("node_client", "make_request")
            .with_metadata("action", json!(action))
            .trace(&format!("Sending RPC request: {}", action));

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status { status: status.as_u16() });
        }

        let body: Value = response.json().await?;

        if let Some(error) = body.get("error") {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(RpcError::Node(message));
        }

        Ok(body)
    }

    async fn timed_request(&self, action: &str, account: &str, request: Value) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", action))
            .with_metadata("account", json!(account));

        let result = self.make_request(action, &request).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(action, duration, result.is_ok());

        result
    }
}

#[async_trait]
impl NodeRpc for NodeClient {
    async fn account_history(&self, account: &str, count: u32) -> Result<Vec<Transaction>, RpcError> {
        let body = self
            .timed_request("account_history", account, account_history_request(account, count))
            .await?;
        let history: Vec<Transaction> = take_field(body, "history")?;

        LogContext::new("node_client", "account_history")
            .with_account(account)
            .with_metadata("count", json!(count))
            .debug(&format!("Retrieved {} history entries", history.len()));

        Ok(history)
    }

    async fn pending(&self, account: &str) -> Result<PendingMap, RpcError> {
        let body = self
            .timed_request("pending", account, pending_request(account))
            .await?;
        let pending: PendingMap = take_field(body, "blocks")?;

        LogContext::new("node_client", "pending")
            .with_account(account)
            .debug(&format!("Retrieved {} pending blocks", pending.len()));

        Ok(pending)
    }
}

/// Pull `field` out of a node response.
///
/// The node answers with an empty string instead of an empty collection when
/// there is nothing to report, so a missing, null or `""` field is the default.
fn take_field<T>(mut body: Value, field: &str) -> Result<T, RpcError>
where
    T: DeserializeOwned + Default,
{
    match body.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::String(s)) if s.is_empty() => Ok(T::default()),
        Some(value @ (Value::Array(_) | Value::Object(_))) => Ok(serde_json::from_value(value)?),
        Some(other) => Err(RpcError::InvalidResponse(format!(
            "unexpected `{}` value: {}",
            field, other
        ))),
    }
}
