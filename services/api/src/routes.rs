use crate::infra::{deserialize_optional_date, AppState};
use crate::screen::{budget_for, screen_frame, ScreenPayload};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use tracing::info;
use warrant_sop::error::AppError;
use warrant_sop::screening::chain;
use warrant_sop::screening::{
    ReportImporter, ScreeningConfig, ScreeningSettings, SopProfile, WarrantScreener,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ScreenRequest {
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) underlying: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) capital: Option<f64>,
    /// Screens with a named preset instead of the startup settings.
    #[serde(default)]
    pub(crate) profile: Option<SopProfile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnderlyingsRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnderlyingsResponse {
    pub(crate) underlyings: Vec<String>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/screen", post(screen_endpoint))
        .route("/api/v1/underlyings", post(underlyings_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn screen_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ScreenRequest>,
) -> Result<Json<ScreenPayload>, AppError> {
    let ScreenRequest {
        csv,
        underlying,
        as_of,
        capital,
        profile,
    } = payload;

    let (profile, screener) = match profile {
        Some(profile) => (
            profile,
            WarrantScreener::new(ScreeningSettings {
                sop: ScreeningConfig::for_profile(profile),
                columns: state.settings.columns.clone(),
            }),
        ),
        None => (
            state.profile,
            WarrantScreener::new(state.settings.as_ref().clone()),
        ),
    };

    let frame = ReportImporter::from_reader(Cursor::new(csv.into_bytes()))?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let run = screen_frame(&screener, &frame, underlying.as_deref(), as_of)?;

    info!(
        %profile,
        underlying = underlying.as_deref().unwrap_or("*"),
        rows = run.report.rows.len(),
        "screen request served"
    );

    Ok(Json(ScreenPayload::new(
        profile,
        as_of,
        run,
        budget_for(capital),
    )))
}

pub(crate) async fn underlyings_endpoint(
    Json(payload): Json<UnderlyingsRequest>,
) -> Result<Json<UnderlyingsResponse>, AppError> {
    let frame = ReportImporter::from_reader(Cursor::new(payload.csv.into_bytes()))?;
    Ok(Json(UnderlyingsResponse {
        underlyings: chain::underlyings(&frame),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use warrant_sop::screening::{CanonicalField, ColumnMap, FieldMapping};

    const REPORT: &str = "權證代碼,權證名稱,標的名稱,權證買價,權證賣價,剩餘天數,Delta\n\
030001,台積電購01,台積電,2.00,2.04,120,0.5\n\
030002,台積電購02,台積電,1.00,1.50,120,0.5\n\
030003,台積電購03,台積電,3.00,3.03,20,0.5\n\
030101,鴻海購01,鴻海,0.80,0.81,120,0.5\n";

    fn app(ready: bool) -> Router {
        app_with(ready, ScreeningSettings::default())
    }

    fn app_with(ready: bool, settings: ScreeningSettings) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
            settings: Arc::new(settings),
            profile: SopProfile::Standard,
        };
        router().layer(Extension(state))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let request = Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .expect("request builds");
        let response = app(false).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let request = Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .expect("request builds");
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn screen_endpoint_ranks_the_requested_chain() {
        let request = post_json(
            "/api/v1/screen",
            json!({
                "csv": REPORT,
                "underlying": "台積電",
                "as_of": "2025-03-18",
                "capital": 1000000.0
            }),
        );
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["profile"], "standard");
        assert_eq!(body["as_of"], "2025-03-18");
        assert_eq!(body["chain"]["warrants"], 3);
        assert_eq!(body["summary"]["passed"], 1);
        assert_eq!(body["summary"]["rejected"], 2);
        assert_eq!(body["rows"][0]["warrant_code"], "030001");
        assert_eq!(body["rows"][1]["reasons"], "too few days to expiry");
        assert_eq!(body["rows"][2]["reasons"], "spread too wide");
        assert_eq!(body["budget"]["max_warrant_allocation"], 150000.0);
    }

    #[tokio::test]
    async fn screen_endpoint_honors_profile_override() {
        let request = post_json(
            "/api/v1/screen",
            json!({
                "csv": REPORT,
                "underlying": "鴻海",
                "as_of": "2025-03-18",
                "profile": "scoring"
            }),
        );
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["profile"], "scoring");
        assert_eq!(body["rows"][0]["score"], 100);
        assert_eq!(body["rows"][0]["tier"], "Selected");
    }

    #[tokio::test]
    async fn profile_override_keeps_startup_column_keywords() {
        let columns = ColumnMap::standard().with_overrides([
            FieldMapping {
                field: CanonicalField::BidPrice,
                keywords: vec!["Bid".to_string()],
            },
            FieldMapping {
                field: CanonicalField::AskPrice,
                keywords: vec!["Ask".to_string()],
            },
        ]);
        let settings = ScreeningSettings {
            columns,
            ..ScreeningSettings::default()
        };
        let csv = "權證代碼,權證名稱,標的名稱,Bid,Ask,剩餘天數,Delta\n\
030101,鴻海購01,鴻海,0.80,0.81,120,0.5\n";
        let request = post_json(
            "/api/v1/screen",
            json!({
                "csv": csv,
                "underlying": "鴻海",
                "as_of": "2025-03-18",
                "profile": "scoring"
            }),
        );
        let response = app_with(true, settings)
            .oneshot(request)
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["profile"], "scoring");
        assert_eq!(body["rows"][0]["bid_price"], 0.8);
        assert_eq!(body["rows"][0]["score"], 100);
        assert_eq!(body["rows"][0]["tier"], "Selected");
    }

    #[tokio::test]
    async fn unknown_underlying_is_a_bad_request() {
        let request = post_json(
            "/api/v1/screen",
            json!({ "csv": REPORT, "underlying": "聯發科" }),
        );
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("聯發科"));
    }

    #[tokio::test]
    async fn headerless_csv_is_a_bad_request() {
        let request = post_json("/api/v1/screen", json!({ "csv": "a,b\n1,2\n" }));
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn underlyings_endpoint_lists_sorted_names() {
        let request = post_json("/api/v1/underlyings", json!({ "csv": REPORT }));
        let response = app(true).oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["underlyings"], json!(["台積電", "鴻海"]));
    }
}
