use super::*;
use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

const CATALOG: &str = r#"[{"id":1,"name":"itemA"},{"id":2,"name":"itemB"},{"id":"7","name":"seven"}]"#;

#[derive(Clone)]
struct BackendState {
    catalog: &'static str,
    submit_status: StatusCode,
    submits: Arc<Mutex<Vec<Value>>>,
    buttons: Arc<Mutex<Vec<Value>>>,
}

struct TestBackend {
    url: String,
    submits: Arc<Mutex<Vec<Value>>>,
    buttons: Arc<Mutex<Vec<Value>>>,
}

async fn handle_catalog(State(state): State<BackendState>) -> Response {
    ([("content-type", "application/json")], state.catalog).into_response()
}

async fn handle_metadata(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "itemA" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({
                "engine": "PathMaker",
                "parameters": [{ "name": "rotations" }, { "name": "rotate" }]
            }))
            .into_response()
        }
        "itemB" => Json(json!({
            "engine": "SpiralAboutCenter",
            "parameters": [{ "name": "rotations" }, { "name": "r0" }, { "name": "r1" }]
        }))
        .into_response(),
        "seven" => Json(json!({ "engine": "E", "parameters": [{ "name": "alpha" }] }))
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_submit(
    State(state): State<BackendState>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.submits.lock().await.push(body);
    state.submit_status
}

async fn handle_button(State(state): State<BackendState>, Json(body): Json<Value>) {
    state.buttons.lock().await.push(body);
}

async fn spawn_backend(
    catalog: &'static str,
    submit_status: StatusCode,
) -> std::io::Result<TestBackend> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = BackendState {
        catalog,
        submit_status,
        submits: Arc::new(Mutex::new(Vec::new())),
        buttons: Arc::new(Mutex::new(Vec::new())),
    };
    let backend = TestBackend {
        url: format!("http://{addr}"),
        submits: state.submits.clone(),
        buttons: state.buttons.clone(),
    };
    let app = Router::new()
        .route("/static/items.json", get(handle_catalog))
        .route("/static/images/:name/meta.json", get(handle_metadata))
        .route("/submit", post(handle_submit))
        .route("/button", post(handle_button))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(backend)
}

async fn loaded_session(client: &SandTableClient) -> OperatorSession {
    let mut session = OperatorSession::new();
    session.load_catalog(client.fetch_catalog().await.expect("catalog"));
    session
}

#[tokio::test]
async fn catalog_is_rendered_in_backend_order() {
    let backend = spawn_backend(CATALOG, StatusCode::OK)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");

    let session = loaded_session(&client).await;
    let names: Vec<_> = session
        .gallery()
        .items()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(names, ["itemA", "itemB", "seven"]);
}

#[tokio::test]
async fn malformed_catalog_is_a_decode_error() {
    let backend = spawn_backend(r#"{"items":"nope"}"#, StatusCode::OK)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");

    let err = client.fetch_catalog().await.expect_err("malformed");
    assert!(matches!(err, ClientError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn submit_posts_the_flattened_form() {
    let backend = spawn_backend(CATALOG, StatusCode::OK)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");
    let mut session = loaded_session(&client).await;

    let tile = session.gallery().position_by_name("seven").expect("tile");
    let ticket = session.select_tile(tile).expect("tile").expect("ticket");
    let response = resolve_selection(&client, ticket).await;
    let metadata = response.result.expect("metadata");
    assert_eq!(
        session.apply_metadata(&response.ticket, metadata),
        SelectionOutcome::Applied
    );
    session.form_mut().set_value("alpha", "3");

    let payload = session.send_data().expect("payload");
    client.submit(&payload).await.expect("submit");

    let submits = backend.submits.lock().await;
    assert_eq!(
        submits.as_slice(),
        [json!({ "item_id": "7", "engine": "E", "alpha": "3" })]
    );
}

#[tokio::test]
async fn rejected_submission_is_not_reported_as_sent() {
    let backend = spawn_backend(CATALOG, StatusCode::UNPROCESSABLE_ENTITY)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");
    let mut session = loaded_session(&client).await;

    let ticket = session.select_tile(1).expect("tile").expect("ticket");
    let response = resolve_selection(&client, ticket).await;
    session.apply_metadata(&response.ticket, response.result.expect("metadata"));

    let err = client
        .submit(&session.send_data().expect("payload"))
        .await
        .expect_err("422");
    match err {
        ClientError::BadStatus { endpoint, status } => {
            assert_eq!(endpoint, "/submit");
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.submits.lock().await.len(), 1);
}

#[tokio::test]
async fn buttons_send_their_task_regardless_of_selection() {
    let backend = spawn_backend(CATALOG, StatusCode::OK)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");

    client.stop().await.expect("stop");
    client.home().await.expect("home");
    client.clear_queue().await.expect("clear");

    let buttons = backend.buttons.lock().await;
    assert_eq!(
        buttons.as_slice(),
        [
            json!({ "task": "stop" }),
            json!({ "task": "home" }),
            json!({ "task": "clear" }),
        ]
    );
}

#[tokio::test]
async fn missing_metadata_keeps_the_previous_selection() {
    let backend = spawn_backend(
        r#"[{"id":2,"name":"itemB"},{"id":9,"name":"ghost"}]"#,
        StatusCode::OK,
    )
    .await
    .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");
    let mut session = loaded_session(&client).await;

    let ticket = session.select_tile(0).expect("tile").expect("ticket");
    let response = resolve_selection(&client, ticket).await;
    session.apply_metadata(&response.ticket, response.result.expect("metadata"));

    let ticket = session.select_tile(1).expect("tile").expect("ticket");
    let response = resolve_selection(&client, ticket).await;
    let err = response.result.expect_err("404");
    assert!(err.is_transport());
    session.reject_metadata(&response.ticket);

    assert_eq!(session.highlighted_tile(), Some(0));
    assert_eq!(session.active().expect("active").item().name, "itemB");
    assert_eq!(session.form().len(), 3);
}

#[tokio::test]
async fn slow_metadata_for_an_earlier_click_is_discarded() {
    let backend = spawn_backend(CATALOG, StatusCode::OK)
        .await
        .expect("spawn backend");
    let client = SandTableClient::new(&backend.url).expect("client");
    let mut session = loaded_session(&client).await;

    let click_a = session.select_tile(0).expect("tile").expect("ticket");
    let click_b = session.select_tile(1).expect("tile").expect("ticket");

    let mut in_flight = FuturesUnordered::new();
    in_flight.push(resolve_selection(&client, click_a));
    in_flight.push(resolve_selection(&client, click_b));

    let mut arrivals = Vec::new();
    while let Some(response) = in_flight.next().await {
        let name = response.ticket.item().name.clone();
        let outcome = session.apply_metadata(&response.ticket, response.result.expect("metadata"));
        arrivals.push((name, outcome));
    }

    assert_eq!(
        arrivals,
        vec![
            ("itemB".to_string(), SelectionOutcome::Applied),
            ("itemA".to_string(), SelectionOutcome::Stale),
        ]
    );
    assert_eq!(session.active().expect("active").metadata().engine, "SpiralAboutCenter");
    assert_eq!(session.highlighted_tile(), Some(1));
}
