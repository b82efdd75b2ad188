pub mod rpc_client;

pub use rpc_client::{NodeClient, NodeRpc, account_history_request, pending_request};
