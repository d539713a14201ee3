use record_tracker_core::{
    AddRecordRequest, DocumentStore, HttpDocumentStore, RecordService, RecordStore, RecordTree,
    RetryPolicy, StoreErrorKind,
};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tiny_http::{Method, Response, Server, StatusCode};

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct ReceivedRequest {
    method: Method,
    url: String,
    body: String,
}

/// Serves `script` responses in order, one per request, then stops.
fn spawn_document_server(
    script: Vec<(u16, &'static str)>,
) -> (
    String,
    Arc<Mutex<Vec<ReceivedRequest>>>,
    thread::JoinHandle<()>,
) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = Arc::clone(&received);
    let handle = thread::spawn(move || {
        for (status, body) in script {
            let mut req = match server.recv_timeout(TIMEOUT) {
                Ok(Some(req)) => req,
                Ok(None) | Err(_) => break,
            };
            let mut request_body = String::new();
            let _ = req.as_reader().read_to_string(&mut request_body);
            received_clone.lock().unwrap().push(ReceivedRequest {
                method: req.method().clone(),
                url: req.url().to_string(),
                body: request_body,
            });
            let _ = req.respond(Response::from_string(body).with_status_code(StatusCode(status)));
        }
    });
    (base, received, handle)
}

fn requests(received: &Arc<Mutex<Vec<ReceivedRequest>>>) -> Vec<ReceivedRequest> {
    received.lock().unwrap().clone()
}

#[test]
fn null_body_reads_as_no_document_with_auth_query() {
    let (base, received, handle) = spawn_document_server(vec![(200, "null")]);
    let store = HttpDocumentStore::new(&base, TIMEOUT)
        .unwrap()
        .with_auth_token("tok");

    assert_eq!(store.read_document("/").unwrap(), None);

    handle.join().unwrap();
    let seen = requests(&received);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::Get);
    assert_eq!(seen[0].url, "/.json?auth=tok");
}

#[test]
fn stored_tree_is_decoded_from_get() {
    let (base, _received, handle) =
        spawn_document_server(vec![(200, r#"{"2024": {"Jan": [null, "x", 1]}}"#)]);
    let store = RecordStore::new(HttpDocumentStore::new(&base, TIMEOUT).unwrap());

    let tree = store.read().unwrap().unwrap();

    handle.join().unwrap();
    assert_eq!(
        tree.to_document(),
        json!({"2024": {"Jan": {"1": "x", "2": 1}}})
    );
}

#[test]
fn write_puts_whole_tree_at_root() {
    let (base, received, handle) = spawn_document_server(vec![(200, "{}")]);
    let store = RecordStore::new(HttpDocumentStore::new(&base, TIMEOUT).unwrap());
    let tree = RecordTree::from_document(json!({
        "2023": {"Dec": {"31": 1}},
        "2024": {"Jan": {"5": "x"}}
    }))
    .unwrap();

    store.write(&tree).unwrap();

    handle.join().unwrap();
    let seen = requests(&received);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::Put);
    assert_eq!(seen[0].url, "/.json");
    let body: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body, tree.to_document());
}

#[test]
fn unauthorized_response_is_permission_error() {
    let (base, _received, handle) =
        spawn_document_server(vec![(401, r#"{"error": "Permission denied"}"#)]);
    let store = HttpDocumentStore::new(&base, TIMEOUT).unwrap();

    let err = store.read_document("/").unwrap_err();

    handle.join().unwrap();
    assert_eq!(err.kind, StoreErrorKind::Permission);
    assert!(err.message.contains("Permission denied"), "{err}");
}

#[test]
fn service_retries_unavailable_store_then_adds() {
    let (base, received, handle) = spawn_document_server(vec![
        (503, "unavailable"),
        (200, "null"),
        (200, r#"{"2024": {"Jan": {"5": "x"}}}"#),
        (200, r#"{"2024": {"Jan": {"5": "x"}}}"#),
    ]);
    let store = HttpDocumentStore::new(&base, TIMEOUT).unwrap();
    let service = RecordService::new(RecordStore::new(store)).with_retry(RetryPolicy::new(2, 0));

    let state = service.load().unwrap();
    assert!(state.tree.is_empty());
    let state = service
        .add(&state, &AddRecordRequest::new("2024", "Jan", "5", "x"))
        .unwrap();

    handle.join().unwrap();
    assert_eq!(state.aggregates.totals.natural, 1);
    let methods = requests(&received)
        .into_iter()
        .map(|request| request.method)
        .collect::<Vec<_>>();
    assert_eq!(
        methods,
        vec![Method::Get, Method::Get, Method::Put, Method::Get]
    );
}

#[test]
fn unanswered_request_times_out_as_transient() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let (release, released) = mpsc::channel::<()>();
    let handle = thread::spawn(move || {
        if let Ok(Some(req)) = server.recv_timeout(TIMEOUT) {
            let _ = released.recv_timeout(TIMEOUT);
            drop(req);
        }
    });
    let store = HttpDocumentStore::new(&base, Duration::from_millis(200)).unwrap();

    let err = store.read_document("/").unwrap_err();

    assert_eq!(err.kind, StoreErrorKind::Transient);
    release.send(()).unwrap();
    handle.join().unwrap();
}
