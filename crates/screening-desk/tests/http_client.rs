//! Exercises the reqwest client against a stub backend served by axum on an
//! ephemeral port, covering request shapes and lenient response decoding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use screening_desk::client::{
    pages_or_catalog, ApiError, HttpScreeningClient, JobSnapshot, PageDescriptor, RecordFilters,
    ReportFilters, ScreeningApi, SubmitOptions,
};
use screening_desk::config::BackendConfig;
use screening_desk::criteria::Criterion;
use screening_desk::domain::{RecordId, RecordStatus, ReportId};
use screening_desk::items::QueryItem;

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Captured {
    fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().expect("body mutex poisoned").clone()
    }

    fn queries(&self) -> Vec<HashMap<String, String>> {
        self.queries.lock().expect("query mutex poisoned").clone()
    }
}

async fn submit(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    captured.bodies.lock().expect("body mutex poisoned").push(body);
    Json(json!({"job_id": "job-9", "status": "queued"}))
}

async fn status(Path(job_id): Path<String>) -> Json<Value> {
    if job_id == "job-9" {
        Json(json!({"status": "done", "data": {"ruc": {"screenshot_path": "/shots/ruc.png", "ok": true}}}))
    } else {
        Json(json!({"status": "error", "error": "captcha failed"}))
    }
}

async fn records(
    State(captured): State<Captured>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    captured
        .queries
        .lock()
        .expect("query mutex poisoned")
        .push(params);
    Json(json!([
        {"id": 7, "nombre": "Jose", "apellido": "Macias", "ci": null, "ruc": "0912345678001",
         "estado": "Procesando", "monto": 1500.5, "fecha": "2025-09-24", "fecha_creacion": "garbage"},
        {"id": {"nested": true}},
        {"id": "8", "estado": "Error", "mensaje_error": "timeout"}
    ]))
}

async fn update_status(
    State(captured): State<Captured>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured
        .bodies
        .lock()
        .expect("body mutex poisoned")
        .push(body.clone());
    Json(json!({"id": id, "estado": body["estado"], "mensaje_error": body.get("mensaje_error")}))
}

async fn reports() -> impl IntoResponse {
    (StatusCode::OK, "this is not json")
}

async fn report_by_job() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "report not ready"})))
}

async fn download(Path(id): Path<String>) -> impl IntoResponse {
    (StatusCode::OK, format!("DOCX-{id}").into_bytes())
}

async fn pages() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn stub_backend() -> (HttpScreeningClient, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/consultas", post(submit))
        .route("/api/consultas/:job_id/status", get(status))
        .route("/api/records", get(records))
        .route("/api/records/:id/estado", put(update_status))
        .route("/api/reports", get(reports))
        .route("/api/reports/by-job/:job_id", get(report_by_job))
        .route("/api/reports/:id/download", get(download))
        .route("/api/paginas", get(pages))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend runs");
    });

    let config = BackendConfig::parse(&format!("http://{addr}/api/")).expect("valid base url");
    (HttpScreeningClient::new(&config), captured)
}

#[tokio::test]
async fn submit_posts_items_with_async_mode() {
    let (api, captured) = stub_backend().await;
    let items = vec![QueryItem::new(Criterion::TaxRegistry, "0912345678001")];

    let ticket = api
        .submit_job(&items, &SubmitOptions::default())
        .await
        .expect("submission accepted");

    assert_eq!(ticket.job_id, "job-9");
    let body = &captured.bodies()[0];
    assert_eq!(body["mode"], "async");
    assert_eq!(body["generate_report"], true);
    assert_eq!(body["headless"], false);
    assert_eq!(body["items"][0], json!({"tipo": "ruc", "valor": "0912345678001"}));
    assert!(body.get("report_meta").is_none());
}

#[tokio::test]
async fn status_decodes_into_snapshots() {
    let (api, _) = stub_backend().await;

    match api.job_status("job-9").await.expect("status") {
        JobSnapshot::Done { results } => {
            assert_eq!(
                results["ruc"].screenshot_path.as_deref(),
                Some("/shots/ruc.png")
            );
            assert_eq!(results["ruc"].extra["ok"], true);
        }
        other => panic!("expected done, got {other:?}"),
    }
    assert_eq!(
        api.job_status("other").await.expect("status"),
        JobSnapshot::Failed {
            message: "captcha failed".to_string()
        }
    );
}

#[tokio::test]
async fn records_are_filtered_and_decoded_leniently() {
    let (api, captured) = stub_backend().await;
    let filters = RecordFilters {
        status: Some(RecordStatus::Processing),
        query: Some("macias".to_string()),
        ..RecordFilters::default()
    };

    let records = api.list_records(&filters).await.expect("records");

    assert_eq!(records.len(), 2, "malformed entry dropped");
    assert_eq!(records[0].id, RecordId::from("7"));
    assert_eq!(records[0].national_id, "");
    assert_eq!(records[0].status, RecordStatus::Processing);
    assert_eq!(records[0].created_at, None);
    assert_eq!(records[1].error_message.as_deref(), Some("timeout"));

    let query = &captured.queries()[0];
    assert_eq!(query.get("estado").map(String::as_str), Some("Procesando"));
    assert_eq!(query.get("q").map(String::as_str), Some("macias"));
    assert!(!query.contains_key("fecha_desde"));
}

#[tokio::test]
async fn status_update_sends_wire_labels() {
    let (api, captured) = stub_backend().await;

    let updated = api
        .update_record_status(&RecordId::from("7"), RecordStatus::Error, Some("captcha failed"))
        .await
        .expect("update accepted")
        .expect("record echoed");

    assert_eq!(updated.status, RecordStatus::Error);
    assert_eq!(
        captured.bodies()[0],
        json!({"estado": "Error", "mensaje_error": "captcha failed"})
    );
}

#[tokio::test]
async fn unparseable_bodies_become_empty_but_errors_stay_fatal() {
    let (api, _) = stub_backend().await;

    let reports = api
        .list_reports(&ReportFilters::default())
        .await
        .expect("2xx with bad body is not an error");
    assert!(reports.is_empty());

    let err = api
        .report_by_job("job-9")
        .await
        .expect_err("404 is fatal");
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "backend returned HTTP 404: report not ready");
}

#[tokio::test]
async fn download_returns_bytes_and_url_matches_route() {
    let (api, _) = stub_backend().await;
    let id = ReportId::from("r-1");

    let bytes = api.download_report(&id).await.expect("download");
    assert_eq!(bytes, b"DOCX-r-1".to_vec());
    assert!(api
        .download_report_url(&id)
        .ends_with("/api/reports/r-1/download"));
}

#[tokio::test]
async fn page_list_falls_back_to_catalog_on_failure() {
    let (api, _) = stub_backend().await;

    let err = api.list_pages().await.expect_err("500 surfaces");
    assert!(matches!(err, ApiError::Http { status: 500, .. }));

    let pages = pages_or_catalog(&api).await;
    assert_eq!(pages, PageDescriptor::catalog());
    assert_eq!(pages.len(), Criterion::ALL.len());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let config = BackendConfig::parse(&format!("http://{addr}/api")).expect("valid");
    let api = HttpScreeningClient::new(&config);

    let err = api.job_status("job-1").await.expect_err("nothing listening");
    assert!(matches!(err, ApiError::Network(_)));
}
