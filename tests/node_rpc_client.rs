use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nano_notifier::error::RpcError;
use nano_notifier::models::TransactionKind;
use nano_notifier::node::{NodeClient, NodeRpc};

async fn client_for(server: &MockServer) -> NodeClient {
    NodeClient::new(server.uri(), 5).expect("Failed to create node client")
}

#[tokio::test]
async fn test_account_history_request_and_parsing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "action": "account_history",
            "account": "xrb_1me",
            "count": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [
                {"hash": "H2", "type": "receive", "account": "xrb_1alice", "amount": "2000000000000000000000000000000"},
                {"hash": "H1", "type": "send", "account": "xrb_1bob", "amount": "1000000000000000000000000000000"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let history = client.account_history("xrb_1me", 10).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].hash, "H2");
    assert_eq!(history[0].kind, TransactionKind::Receive);
    assert_eq!(history[1].kind, TransactionKind::Send);
}

#[tokio::test]
async fn test_pending_request_and_parsing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "action": "pending",
            "account": "xrb_1me",
            "source": "true"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocks": {
                "P1": {"amount": "6000000000000000000000000000000", "source": "xrb_1alice"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let pending = client.pending("xrb_1me").await.unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending["P1"].source, "xrb_1alice");
}

#[tokio::test]
async fn test_empty_responses() {
    let mock_server = MockServer::start().await;

    // The node uses an empty string for "nothing here"
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"action": "account_history"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"history": ""})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"action": "pending"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"blocks": ""})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    assert!(client.account_history("xrb_1me", 10).await.unwrap().is_empty());
    assert!(client.pending("xrb_1me").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    assert!(client.account_history("xrb_1me", 10).await.unwrap().is_empty());
    assert!(client.pending("xrb_1me").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_node_failures() {
    let mock_server = MockServer::start().await;
    let client = client_for(&mock_server).await;

    // Node-level error
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Bad account number"})))
        .mount(&mock_server)
        .await;

    let result = client.account_history("not_an_account", 10).await;
    match result {
        Err(RpcError::Node(message)) => assert_eq!(message, "Bad account number"),
        other => panic!("expected node error, got {:?}", other),
    }

    // HTTP error
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let result = client.pending("xrb_1me").await;
    assert!(matches!(result, Err(RpcError::Status { status: 500 })));

    // Not JSON
    mock_server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let result = client.pending("xrb_1me").await;
    assert!(matches!(result, Err(RpcError::Http(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = NodeClient::new("http://127.0.0.1:9".to_string(), 2).unwrap();

    let result = client.account_history("xrb_1me", 10).await;
    assert!(matches!(result, Err(RpcError::Http(_))));
}
