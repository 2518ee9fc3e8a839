//! SocketDispatcher against an in-process websocket server.

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use url::Url;

use lti_grader::components::SocketDispatcher;
use lti_grader::config::{PageContext, Settings};
use lti_grader::grading::GradingClient;
use lti_grader::page::{Page, ServerState};

const SCRIPT: &[&str] = &[
    r#"{"event":"connected","args":[]}"#,
    r#"{"event":"test_result","args":[{"name":"build","result":{"status":"success"}},{"name":"lint","result":{"status":"failed","error":"<script>x</script>"}}]}"#,
    r#"{"event":"something_new","args":{}}"#,
    "not json at all",
    r#"{"event":"test_result","args":{"name":"ghost","result":{"status":"success"}}}"#,
    r#"{"event":"disconnected","args":[]}"#,
];

async fn client_socket(ws: WebSocketUpgrade, Path(email): Path<String>) -> impl IntoResponse {
    assert_eq!(email, "s@example.net");
    ws.on_upgrade(push_script)
}

async fn push_script(mut socket: WebSocket) {
    for frame in SCRIPT {
        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
            return;
        }
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "done".to_string().into(),
        })))
        .await;
}

async fn spawn_server() -> std::net::SocketAddr {
    let app = Router::new().route("/ws/client/{email}", get(client_socket));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn dispatcher(addr: std::net::SocketAddr, page: Arc<Page>) -> SocketDispatcher {
    let api = Arc::new(GradingClient::with_base_url(
        Url::parse(&format!("http://{addr}/")).unwrap(),
    ));
    SocketDispatcher::new(page, api, PageContext::new("s@example.net", "task-1", "launch-1"))
}

#[tokio::test]
async fn test_dispatches_script_until_close() {
    let addr = spawn_server().await;
    let page = Arc::new(Page::new(["build", "lint"]));
    let settings = Settings {
        host: addr.to_string(),
        ..Settings::default()
    };
    let url = settings.client_socket_url("s@example.net").unwrap();

    dispatcher(addr, page.clone()).run(&url).await.unwrap();

    assert_eq!(page.server_state(), ServerState::Off);
    assert_eq!(page.result("build").unwrap().text_content(), "Success");

    let lint = page.result("lint").unwrap();
    assert_eq!(lint.tag, "details");
    assert!(!lint.to_html().contains("<script>"));
    assert!(page.notice().is_some());
}

#[tokio::test]
async fn test_connect_failure_is_websocket_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let page = Arc::new(Page::new(["build"]));
    let url = Url::parse(&format!("ws://{addr}/ws/client/s@example.net")).unwrap();
    let err = dispatcher(addr, page.clone()).run(&url).await.unwrap_err();
    assert_eq!(err.kind(), "websocket");
    assert_eq!(page.server_state(), ServerState::Unknown);
}
