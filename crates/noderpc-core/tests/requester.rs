use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use noderpc_core::{BatchEntry, JsonRpcRequest, Requester, RpcTransport, TransportError};

/// Answers `chain_chainID` with a fixed envelope, whatever the request id.
struct FixedTransport;

#[async_trait]
impl RpcTransport for FixedTransport {
    async fn send(&self, _req: JsonRpcRequest) -> Result<Value, TransportError> {
        Ok(json!({"jsonrpc": "2.0", "id": 1, "result": "0x5"}))
    }

    fn url(&self) -> &str {
        "fixed"
    }
}

/// Echoes the request id back as the result and records the ids.
#[derive(Default)]
struct EchoIdTransport {
    ids: Mutex<Vec<u64>>,
}

#[async_trait]
impl RpcTransport for EchoIdTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        let id = req.id.as_u64().ok_or_else(|| TransportError::Other("non-numeric id".into()))?;
        self.ids.lock().unwrap().push(id);
        tokio::task::yield_now().await;
        Ok(json!({"jsonrpc": "2.0", "id": id, "result": id}))
    }

    fn url(&self) -> &str {
        "echo"
    }
}

#[tokio::test]
async fn chain_id_scenario() {
    let requester = Requester::new(Arc::new(FixedTransport));
    let chain_id = requester.send("chain_chainID", vec![]).await.unwrap();
    assert_eq!(chain_id, json!("0x5"));
}

#[tokio::test]
async fn concurrent_sends_get_unique_ids() {
    let transport = Arc::new(EchoIdTransport::default());
    let requester = Requester::new(transport.clone());

    let calls = (0..64).map(|_| {
        let requester = requester.clone();
        async move { requester.send("chain_latestStableHeight", vec![]).await }
    });
    let results = futures::future::join_all(calls).await;

    let ids: HashSet<u64> = results
        .into_iter()
        .map(|r| r.unwrap().as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 64);
    assert_eq!(ids.iter().min(), Some(&1));
    assert_eq!(ids.iter().max(), Some(&64));
}

#[tokio::test]
async fn default_batch_sends_sequentially_in_order() {
    let transport = Arc::new(EchoIdTransport::default());
    let requester = Requester::new(transport.clone());

    let responses = requester
        .send_batch(vec![
            BatchEntry::method("chain_chainID"),
            BatchEntry::method("chain_latestStableHeight"),
            BatchEntry::new("chain_getBlockByHeight", vec![json!(7)]),
        ])
        .await
        .unwrap();

    let results: Vec<Value> = responses.into_iter().map(|r| r.result.unwrap()).collect();
    assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(*transport.ids.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn batch_and_single_calls_share_the_id_sequence() {
    let transport = Arc::new(EchoIdTransport::default());
    let requester = Requester::new(transport.clone());

    requester.send("chain_chainID", vec![]).await.unwrap();
    requester
        .send_batch(vec![BatchEntry::method("a_b"), BatchEntry::method("c_d")])
        .await
        .unwrap();
    let last = requester.send("chain_chainID", vec![]).await.unwrap();
    assert_eq!(last, json!(4));
}
