//! HTTP routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sheetshift_core::{
    ErrorKind, FilterCriteria, FilteredData, HeaderMismatch, TransferError, TransferRequest,
    TransferService, TransferStats, TransferStatus,
};
use sheetshift_sheet::{MemoryProvider, Sheet, SheetRef};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: TransferService,
    /// Backing store, for the sheet load/read endpoints.
    pub sheets: Arc<MemoryProvider>,
}

impl AppState {
    pub fn new(service: TransferService, sheets: Arc<MemoryProvider>) -> Self {
        Self { service, sheets }
    }
}

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    /// Server status ("ok" when healthy).
    pub status: String,
    /// Server version from Cargo.toml.
    pub version: String,
}

/// Health check endpoint handler.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Error body: `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Write | ErrorKind::Delete | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransferResponse {
    pub success: bool,
    pub message: String,
    pub transfer_id: String,
}

async fn start_transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StartTransferResponse>)> {
    let Json(request) = payload?;
    let transfer_id = state.service.start(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StartTransferResponse {
            success: true,
            message: "Transfer started".to_string(),
            transfer_id,
        }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub status: TransferStatus,
    pub progress: u8,
    pub message: Option<String>,
    pub stats: TransferStats,
}

async fn transfer_progress(
    State(state): State<AppState>,
    Path(transfer_id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let record = state.service.progress(&transfer_id).await?;
    Ok(Json(ProgressResponse {
        status: record.status,
        progress: record.progress,
        message: record.message,
        stats: record.stats,
    }))
}

#[derive(Debug, Deserialize)]
struct ValidateHeadersBody {
    source: SheetRef,
    destination: SheetRef,
}

#[derive(Debug, Serialize)]
struct ValidateHeadersResponse {
    valid: bool,
    mismatch: Option<HeaderMismatch>,
}

async fn validate_headers(
    State(state): State<AppState>,
    payload: Result<Json<ValidateHeadersBody>, JsonRejection>,
) -> ApiResult<Json<ValidateHeadersResponse>> {
    let Json(body) = payload?;
    let mismatch = state
        .service
        .validate_headers(&body.source, &body.destination)
        .await?;
    Ok(Json(ValidateHeadersResponse {
        valid: mismatch.is_none(),
        mismatch,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewBody {
    sheet: SheetRef,
    from_date: NaiveDate,
    to_date: NaiveDate,
    #[serde(default)]
    status: Option<String>,
}

async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewBody>, JsonRejection>,
) -> ApiResult<Json<FilteredData>> {
    let Json(body) = payload?;
    let criteria = FilterCriteria {
        from_date: body.from_date,
        to_date: body.to_date,
        status: body.status,
    };
    let data = state.service.filtered_data(&body.sheet, &criteria).await?;
    Ok(Json(data))
}

async fn get_sheet(
    State(state): State<AppState>,
    Path((spreadsheet_id, sheet_name)): Path<(String, String)>,
) -> ApiResult<Json<Sheet>> {
    let sheet_ref = SheetRef::new(spreadsheet_id, sheet_name);
    let sheet = state
        .sheets
        .snapshot(&sheet_ref)
        .await
        .map_err(|e| TransferError::read("read sheet", e))?;
    Ok(Json(sheet))
}

#[derive(Debug, Deserialize)]
struct PutSheetBody {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

async fn put_sheet(
    State(state): State<AppState>,
    Path((spreadsheet_id, sheet_name)): Path<(String, String)>,
    payload: Result<Json<PutSheetBody>, JsonRejection>,
) -> ApiResult<Json<Sheet>> {
    let Json(body) = payload?;
    if body.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ApiError::bad_request("A sheet needs a header row"));
    }
    let sheet = Sheet::with_rows(&sheet_name, body.headers, body.rows);
    let sheet_ref = SheetRef::new(spreadsheet_id, sheet_name);
    tracing::info!(sheet = %sheet_ref, rows = sheet.row_count(), "Sheet loaded");
    state.sheets.insert_sheet(&sheet_ref, sheet.clone()).await;
    Ok(Json(sheet))
}

/// Create the application router.
///
/// This is separated from `main()` to allow testing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/transfers", post(start_transfer))
        .route("/api/transfers/:id", get(transfer_progress))
        .route("/api/headers/validate", post(validate_headers))
        .route("/api/preview", post(preview))
        .route(
            "/api/spreadsheets/:id/sheets/:name",
            get(get_sheet).put(put_sheet),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use sheetshift_core::TransferConfig;
    use sheetshift_sheet::SheetProvider;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn state() -> AppState {
        let sheets = Arc::new(MemoryProvider::new());
        sheets
            .insert_sheet(
                &SheetRef::new("orders", "Pending"),
                Sheet::from_data(vec![
                    vec!["DATE", "ORDER ID", "STATUS"],
                    vec!["2024-01-10", "ORD-001", "pending"],
                    vec!["2024-01-11", "ORD-002", "pending"],
                    vec!["2024-01-12", "ORD-003", "shipped"],
                ]),
            )
            .await;
        sheets
            .insert_sheet(
                &SheetRef::new("orders", "Archive"),
                Sheet::from_data(vec![
                    vec!["DATE", "ORDER ID", "STATUS"],
                    vec!["2024-01-01", "ORD-001", "delivered"],
                ]),
            )
            .await;
        let service = TransferService::in_memory(
            Arc::clone(&sheets) as Arc<dyn SheetProvider>,
            TransferConfig::default(),
        )
        .unwrap();
        AppState::new(service, sheets)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn transfer_body() -> Value {
        json!({
            "sourceSpreadsheetId": "orders",
            "sourceSheetName": "Pending",
            "destinationSpreadsheetId": "orders",
            "destinationSheetName": "Archive",
            "fromDate": "2024-01-10",
            "toDate": "2024-01-12",
            "status": "pending",
            "mode": "move"
        })
    }

    #[tokio::test]
    async fn test_health_endpoint_body() {
        let app = create_router(state().await);
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: Health = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let app = create_router(state().await);
        let response = app.oneshot(get("/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transfer_lifecycle() {
        let state = state().await;
        let app = create_router(state.clone());

        let (status, body) = send(app.clone(), post_json("/api/transfers", &transfer_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["success"], true);
        let id = body["transferId"].as_str().unwrap().to_string();

        let mut progress = Value::Null;
        for _ in 0..200 {
            let (status, body) = send(app.clone(), get(&format!("/api/transfers/{id}"))).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == "completed" || body["status"] == "failed" {
                progress = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(progress["status"], "completed");
        assert_eq!(progress["progress"], 100);
        assert_eq!(progress["stats"]["totalRows"], 2);
        assert_eq!(progress["stats"]["duplicates"], 1);
        assert_eq!(
            progress["message"],
            "Successfully moved 1 row (1 duplicates skipped)"
        );

        let (_, archive) = send(app, get("/api/spreadsheets/orders/sheets/Archive")).await;
        assert_eq!(archive["rows"].as_array().unwrap().len(), 2);
        assert_eq!(archive["rows"][1][1], "ORD-002");
    }

    #[tokio::test]
    async fn test_unsupported_duplicate_handling_is_bad_request() {
        let app = create_router(state().await);
        let mut body = transfer_body();
        body["duplicateHandling"] = json!("update");

        let (status, body) = send(app, post_json("/api/transfers", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("update"));
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let app = create_router(state().await);
        let mut body = transfer_body();
        body.as_object_mut().unwrap().remove("toDate");

        let (status, body) = send(app, post_json("/api/transfers", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("toDate"));
    }

    #[tokio::test]
    async fn test_malformed_preview_body_is_bad_request() {
        let app = create_router(state().await);
        let body = json!({
            "sheet": {"spreadsheetId": "orders", "sheetName": "Pending"},
            "fromDate": "10/01/2024",
            "toDate": "2024-01-11"
        });
        let (status, body) = send(app, post_json("/api/preview", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_transfer_is_not_found() {
        let app = create_router(state().await);
        let (status, body) = send(app, get("/api/transfers/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_validate_headers() {
        let app = create_router(state().await);
        let body = json!({
            "source": {"spreadsheetId": "orders", "sheetName": "Pending"},
            "destination": {"spreadsheetId": "orders", "sheetName": "Archive"}
        });
        let (status, body) = send(app, post_json("/api/headers/validate", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        let missing = body["mismatch"]["missing"].as_array().unwrap();
        assert!(missing.contains(&json!("CUSTOMER NAME")));
    }

    #[tokio::test]
    async fn test_validate_headers_missing_sheet() {
        let app = create_router(state().await);
        let body = json!({
            "source": {"spreadsheetId": "orders", "sheetName": "Pending"},
            "destination": {"spreadsheetId": "nope", "sheetName": "Archive"}
        });
        let (status, _) = send(app, post_json("/api/headers/validate", &body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview() {
        let app = create_router(state().await);
        let body = json!({
            "sheet": {"spreadsheetId": "orders", "sheetName": "Pending"},
            "fromDate": "2024-01-10",
            "toDate": "2024-01-11"
        });
        let (status, body) = send(app, post_json("/api/preview", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rowCount"], 2);
        assert_eq!(body["sourceRowNumbers"], json!([2, 3]));
    }

    #[tokio::test]
    async fn test_preview_without_date_column() {
        let state = state().await;
        state
            .sheets
            .insert_sheet(
                &SheetRef::new("orders", "Notes"),
                Sheet::with_headers("Notes", vec!["NOTE"]),
            )
            .await;
        let app = create_router(state);
        let body = json!({
            "sheet": {"spreadsheetId": "orders", "sheetName": "Notes"},
            "fromDate": "2024-01-10",
            "toDate": "2024-01-11"
        });
        let (status, _) = send(app, post_json("/api/preview", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_put_then_get_sheet() {
        let app = create_router(state().await);
        let request = Request::builder()
            .method("PUT")
            .uri("/api/spreadsheets/imports/sheets/Today")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "headers": ["DATE", "ORDER ID"],
                    "rows": [["2024-01-10", "ORD-9", "extra"]]
                })
                .to_string(),
            ))
            .unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, sheet) = send(app, get("/api/spreadsheets/imports/sheets/Today")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sheet["name"], "Today");
        assert_eq!(sheet["rows"], json!([["2024-01-10", "ORD-9"]]));
    }

    #[tokio::test]
    async fn test_get_missing_sheet() {
        let app = create_router(state().await);
        let (status, body) = send(app, get("/api/spreadsheets/orders/sheets/Nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
