use std::path::Path;

use anyhow::Result;
use axum::{
    extract::{Path as RoutePath, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::info;

use super::state::ServerState;
use super::ServerConfig;
use crate::browse::{list_dir, preview_file, BrowseError};
use crate::jobs::{Job, JobRegistry, JobRunner, SubmitError};

/// `GET /api/jobs` returns this many of the most recently started jobs.
const RECENT_JOBS_LIMIT: usize = 5;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for BrowseError {
    fn into_response(self) -> Response {
        let status = match &self {
            BrowseError::PathNotFound => StatusCode::NOT_FOUND,
            BrowseError::NotADirectory | BrowseError::NotAFile => StatusCode::BAD_REQUEST,
            BrowseError::PermissionDenied => StatusCode::FORBIDDEN,
            BrowseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let status = match &self {
            SubmitError::ScriptNotFound => StatusCode::NOT_FOUND,
            SubmitError::InvalidScriptType => StatusCode::BAD_REQUEST,
        };
        error_response(status, self.to_string())
    }
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Deserialize)]
struct BrowseQuery {
    path: Option<String>,
}

async fn browse(
    State(config): State<ServerConfig>,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let path = query
        .path
        .filter(|p| !p.is_empty())
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.base_dir.clone());
    match list_dir(&path) {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize)]
struct RunBody {
    script: Option<String>,
    #[serde(default)]
    args: String,
}

#[derive(Serialize)]
struct RunResponse {
    job_id: String,
    status: &'static str,
}

async fn run_script(State(runner): State<JobRunner>, Json(body): Json<RunBody>) -> Response {
    let Some(script) = body.script.filter(|s| !s.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "No script specified");
    };
    match runner.submit(&script, &body.args) {
        Ok(job_id) => Json(RunResponse {
            job_id,
            status: "running",
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Serialize)]
struct JobsResponse {
    jobs: Vec<Job>,
}

async fn list_jobs(State(registry): State<JobRegistry>) -> Json<JobsResponse> {
    Json(JobsResponse {
        jobs: registry.list_recent(RECENT_JOBS_LIMIT),
    })
}

async fn get_job(
    State(registry): State<JobRegistry>,
    RoutePath(id): RoutePath<String>,
) -> Response {
    match registry.get(&id) {
        Some(job) => Json(job).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Job not found"),
    }
}

#[derive(Deserialize)]
struct PreviewQuery {
    path: Option<String>,
}

async fn preview(Query(query): Query<PreviewQuery>) -> Response {
    let Some(path) = query.path.filter(|p| !p.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "No path specified");
    };
    match preview_file(Path::new(&path)) {
        Ok(preview) => Json(preview).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_app(config: ServerConfig, registry: JobRegistry, runner: JobRunner) -> Router {
    let state = ServerState {
        config: config.clone(),
        registry,
        runner,
    };

    let api_routes: Router = Router::new()
        .route("/browse", get(browse))
        .route("/run", post(run_script))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/preview", get(preview))
        .with_state(state);

    let app: Router = Router::new().nest("/api", api_routes);
    match &config.frontend_dir_path {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.route("/", get(home)),
    }
}

pub async fn run_server(
    config: ServerConfig,
    registry: JobRegistry,
    runner: JobRunner,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, registry, runner);

    // 0.0.0.0 so the service is reachable from containers on the same host.
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::fs::File;
    use std::io::Write as _;
    use std::time::Duration;
    use tower::ServiceExt;

    fn make_test_app(base_dir: &Path) -> (Router, JobRegistry) {
        let config = ServerConfig {
            base_dir: base_dir.to_path_buf(),
            ..Default::default()
        };
        let registry = JobRegistry::new();
        // Scripts run through `sh` so tests have no interpreter dependency.
        let runner =
            JobRunner::new(registry.clone()).with_launcher(vec!["sh".to_string()]);
        (make_app(config, registry.clone(), runner), registry)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn home_serves_embedded_page() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = make_test_app(dir.path());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("<html"));
    }

    #[tokio::test]
    async fn browse_defaults_to_base_dir_and_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("tool.py")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let (app, _) = make_test_app(dir.path());

        let (status, body) = get(&app, "/api/browse").await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "sub");
        assert_eq!(items[0]["is_dir"], true);
        assert_eq!(items[1]["name"], "tool.py");
        assert_eq!(items[1]["is_script"], true);
    }

    #[tokio::test]
    async fn browse_maps_errors_to_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        File::create(&file).unwrap();
        let (app, _) = make_test_app(dir.path());

        let (status, body) = get(&app, "/api/browse?path=/definitely/not/there").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Path does not exist");

        let (status, body) =
            get(&app, &format!("/api/browse?path={}", file.display())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Path is not a directory");
    }

    #[tokio::test]
    async fn run_validates_before_creating_any_job() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        let (app, registry) = make_test_app(dir.path());

        let (status, body) = post_json(&app, "/api/run", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No script specified");

        let (status, body) = post_json(
            &app,
            "/api/run",
            serde_json::json!({"script": "/definitely/not/there.py", "args": ""}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Script does not exist");

        let (status, body) = post_json(
            &app,
            "/api/run",
            serde_json::json!({
                "script": dir.path().join("notes.txt").to_string_lossy(),
                "args": ""
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Not a Python file");

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn run_returns_job_id_and_job_completes() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hello.py");
        File::create(&script)
            .unwrap()
            .write_all(b"echo hello\n")
            .unwrap();
        let (app, registry) = make_test_app(dir.path());

        let (status, body) = post_json(
            &app,
            "/api/run",
            serde_json::json!({
                "script": script.to_string_lossy(),
                "args": ""
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        let job_id = body["job_id"].as_str().unwrap().to_string();
        assert_eq!(job_id.len(), 8);

        for _ in 0..500 {
            if registry.get(&job_id).unwrap().status != JobStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, body) = get(&app, &format!("/api/jobs/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["returncode"], 0);
        assert_eq!(body["stdout"], "hello\n");
        assert_eq!(body["error"], Value::Null);
        assert!(body["finished"].is_string());
    }

    #[tokio::test]
    async fn jobs_endpoints_report_recent_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = make_test_app(dir.path());

        let (status, body) = get(&app, "/api/jobs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"].as_array().unwrap().len(), 0);

        let (status, body) = get(&app, "/api/jobs/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Job not found");
    }

    #[tokio::test]
    async fn preview_returns_content_and_maps_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.py");
        File::create(&file)
            .unwrap()
            .write_all(b"print('hi')\n")
            .unwrap();
        let (app, _) = make_test_app(dir.path());

        let (status, body) =
            get(&app, &format!("/api/preview?path={}", file.display())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "print('hi')\n");
        assert_eq!(body["name"], "hello.py");

        let (status, body) = get(&app, "/api/preview").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No path specified");

        let (status, body) =
            get(&app, &format!("/api/preview?path={}", dir.path().display())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Not a file");

        let (status, _) = get(&app, "/api/preview?path=/definitely/not/there").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
