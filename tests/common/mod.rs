//! Shared fixtures for integration tests.
//!
//! Provides:
//! - An in-process test application on an ephemeral port
//! - Logging initialization
//! - Driver construction against the test application

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Form, Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{any, get, post, put};
use formsurf::{Driver, RetryPolicy};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Body served by `/download/pdf`.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";

/// Number of 503 responses `/flaky` sends before succeeding.
pub const FLAKY_FAILURES: usize = 2;

// ============================================================================
// Types
// ============================================================================

/// A running test application.
#[derive(Debug, Clone)]
pub struct TestApp {
    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub base_url: String,
    /// Address the application listens on.
    pub addr: SocketAddr,
    /// Requests seen by `/flaky`.
    pub flaky_hits: Arc<AtomicUsize>,
}

impl TestApp {
    /// Returns an absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Returns how many times `/flaky` was requested.
    pub fn flaky_count(&self) -> usize {
        self.flaky_hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct AppState {
    flaky_hits: Arc<AtomicUsize>,
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging from `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Starts the test application on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    init_logging();

    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let state = AppState {
        flaky_hits: Arc::clone(&flaky_hits),
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test app");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router(state))
            .await
            .expect("test app server");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        addr,
        flaky_hits,
    }
}

/// Builds a driver prefixed with the application's base URL.
pub fn driver(app: &TestApp) -> Driver {
    Driver::builder()
        .prefix_url(&app.base_url)
        .timeout(Duration::from_secs(10))
        .retry(RetryPolicy::default().with_base_delay(Duration::from_millis(10)))
        .build()
        .expect("build driver")
}

// ============================================================================
// Router
// ============================================================================

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(index))
        .route("/page", get(page))
        .route("/link1Destination", get(link1_destination))
        .route("/form1Destination", post(form1_destination))
        .route("/form2Destination", post(form2_destination))
        .route("/json1", post(json_ok))
        .route("/json2", put(json_ok))
        .route("/json3", get(json_ok))
        .route("/not-found-html", get(not_found_html))
        .route("/server-error-html", get(server_error_html))
        .route("/server-error", get(server_error))
        .route("/file-upload", get(file_upload_form).post(file_upload_submit))
        .route("/download/pdf", get(download_pdf))
        .route("/search-form", get(search_form))
        .route("/search", get(search))
        .route("/login", get(login))
        .route("/whoami", get(whoami))
        .route("/old-page", get(|| async { Redirect::to("/page") }))
        .route("/flaky", get(flaky))
        .with_state(state)
}

fn page_html(title: &str, body_id: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body data-test-id="{body_id}">
{body}
</body>
</html>"#
    )
}

// ============================================================================
// Handlers - Pages
// ============================================================================

async fn index() -> Html<String> {
    Html(page_html(
        "Test Express App",
        "test-express-app",
        r#"<p><a data-test-id="link1" href="/link1Destination">Link 1</a></p>
<p><a data-test-id="no-href">No href</a></p>

<form method="POST" action="/form1Destination">
    <label for="input1">Input 1</label>
    <input data-test-id="input1" name="input1">

    <input data-test-id="submit1" type="submit" name="submit1" value="Submit 1">
</form>

<form method="POST" action="/form2Destination">
    <label for="input2">Input 2</label>
    <input data-test-id="input2" name="input2">

    <button data-test-id="submit2" type="submit" name="submit2" value="Submit 2">Submit 2 button text</button>
</form>"#,
    ))
}

async fn page() -> Html<String> {
    Html(page_html(
        "Page - Test Express App",
        "I am a page",
        "<p>A page</p>",
    ))
}

async fn link1_destination() -> Html<String> {
    Html(page_html(
        "Link 1 Destination - Test Express App",
        "link1Destination",
        "<p>Yes hello what link 1 destination</p>",
    ))
}

async fn form1_destination(Form(body): Form<HashMap<String, String>>) -> Html<String> {
    Html(form_echo("Form 1", "form1Destination", &body, &["input1", "submit1"]))
}

async fn form2_destination(Form(body): Form<HashMap<String, String>>) -> Html<String> {
    Html(form_echo("Form 2", "form2Destination", &body, &["input2", "submit2"]))
}

fn form_echo(
    form: &str,
    body_id: &str,
    body: &HashMap<String, String>,
    fields: &[&str],
) -> String {
    let rows: String = fields
        .iter()
        .map(|field| {
            let value = body.get(*field).map_or("undefined", String::as_str);
            format!(
                "<dt>{field}:</dt>\n<dd data-test-id=\"{field}-value\">{value}</dd>\n"
            )
        })
        .collect();

    page_html(
        &format!("{form} (submitted) - Test Express App"),
        body_id,
        &format!("<dl>\n{rows}</dl>"),
    )
}

async fn json_ok() -> axum::Json<Value> {
    axum::Json(json!({ "a": "ok" }))
}

// ============================================================================
// Handlers - Errors
// ============================================================================

async fn not_found_html() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(page_html(
            "WHAT? Not found - Test Express App",
            "not-found",
            "<p>Nothing here</p>",
        )),
    )
}

async fn server_error_html() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(page_html(
            "BIG BAD SERVER ERROR - Test Express App",
            "server-error",
            "<p>Oh no</p>",
        )),
    )
}

async fn server_error() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

async fn flaky(State(state): State<AppState>) -> impl IntoResponse {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    if hit < FLAKY_FAILURES {
        return (StatusCode::SERVICE_UNAVAILABLE, Html(String::from("busy"))).into_response();
    }
    Html(page_html("Flaky - Test Express App", "flaky", "<p>Finally</p>")).into_response()
}

// ============================================================================
// Handlers - Files
// ============================================================================

async fn file_upload_form() -> Html<String> {
    Html(page_html(
        "File upload - Test Express App",
        "file-upload",
        r#"<form method="POST" action="/file-upload" enctype="multipart/form-data">
    <input type="hidden" name="note" value="hello">
    <input type="file" name="file_field">
    <input type="submit" value="Upload">
</form>"#,
    ))
}

async fn file_upload_submit(mut multipart: Multipart) -> Html<String> {
    let mut note = String::new();
    let mut fieldname = String::new();
    let mut originalname = String::new();
    let mut mimetype = String::new();
    let mut size = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap_or_default();
                fieldname = name;
                originalname = file_name;
                mimetype = content_type;
                size = bytes.len().to_string();
            }
            None if name == "note" => {
                note = field.text().await.unwrap_or_default();
            }
            None => {}
        }
    }

    Html(page_html(
        "File upload (submitted) - Test Express App",
        "file-upload-submitted",
        &format!(
            r#"<dl>
<dd data-test-id="req.body.note">{note}</dd>
<dd data-test-id="req.file.fieldname">{fieldname}</dd>
<dd data-test-id="req.file.originalname">{originalname}</dd>
<dd data-test-id="req.file.mimetype">{mimetype}</dd>
<dd data-test-id="req.file.size">{size}</dd>
</dl>"#
        ),
    ))
}

async fn download_pdf() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"testPDF.pdf\""),
        ],
        PDF_BYTES,
    )
}

// ============================================================================
// Handlers - Query Forms
// ============================================================================

async fn search_form() -> Html<String> {
    Html(page_html(
        "Search - Test Express App",
        "search-form",
        r#"<form method="get" action="/search?stale=1#results">
    <input name="q" value="rust">
    <select name="lang" multiple>
        <option selected>en</option>
        <option value="de">German</option>
        <option selected value="fr">French</option>
    </select>
    <input type="checkbox" name="exact" value="yes" checked>
    <input type="checkbox" name="skip" value="no">
    <input name="off" value="x" disabled>
    <button name="go" value="1">Go</button>
</form>"#,
    ))
}

async fn search(Query(params): Query<Vec<(String, String)>>) -> Html<String> {
    let items: String = params
        .iter()
        .map(|(name, value)| format!("<li data-test-id=\"param\">{name}={value}</li>\n"))
        .collect();

    Html(page_html(
        "Search results - Test Express App",
        "search",
        &format!("<ul>\n{items}</ul>"),
    ))
}

// ============================================================================
// Handlers - Cookies
// ============================================================================

async fn login() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, "session=abc123; Path=/")],
        Html(page_html("Logged in - Test Express App", "login", "<p>Welcome</p>")),
    )
}

async fn whoami(headers: HeaderMap) -> Html<String> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    Html(page_html(
        "Who am I - Test Express App",
        "whoami",
        &format!("<p data-test-id=\"cookie\">{cookie}</p>"),
    ))
}
