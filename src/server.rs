//! HTTP boundary: `GET /search/{item_name}` over a single shared session.

use crate::browser::Browser;
use crate::error::LookupError;
use crate::justwatch::{MediaEntry, Session};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// The process-wide session. The mutex queues concurrent requests, since a
/// browser can only work on one page at a time.
pub type SharedSession<B> = Arc<Mutex<Session<B>>>;

/// Builds the router serving lookups against `session`.
pub fn router<B>(session: SharedSession<B>) -> Router
where
    B: Browser + 'static,
{
    Router::new()
        .route("/search/{item_name}", get(search_handler::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

async fn search_handler<B>(
    State(session): State<SharedSession<B>>,
    Path(item_name): Path<String>,
) -> Result<Json<Vec<MediaEntry>>, ApiError>
where
    B: Browser + 'static,
{
    let session = session.lock().await;
    let entries = session.search(&item_name).await?;
    Ok(Json(entries))
}

/// A lookup failure rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(LookupError);

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            LookupError::NoResults { .. } => StatusCode::NOT_FOUND,
            LookupError::Extraction { .. } => StatusCode::BAD_GATEWAY,
            LookupError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Lookup failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{DriverError, FixtureBrowser};
    use crate::error::FieldError;
    use crate::justwatch::selectors;
    use crate::justwatch::SessionOptions;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const RESULTS: &str = r#"<html><body>
        <div class="title-list-row__row">
            <span class="header-title">Inception</span>
            <span class="header-year">(2010)</span>
            <div class="buybox-row">
                <div class="buybox-row__label">buy</div>
                <div class="buybox-row__offers">
                    <a class="offer" href="https://example.com/buy"><img alt="ExampleStore"><span class="offer__label">$9.99 HD</span></a>
                </div>
            </div>
        </div>
    </body></html>"#;

    async fn app() -> Router {
        let url = selectors::search_url(selectors::BASE_URL, &Default::default(), "Inception");
        let browser = FixtureBrowser::new()
            .with_page(selectors::BASE_URL, "<html><body></body></html>")
            .with_page(url, RESULTS)
            .with_fallback_page("<html><body><p>Nothing</p></body></html>");
        let session = Session::open(browser, SessionOptions::default()).await.unwrap();
        router(Arc::new(Mutex::new(session)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_search_route_returns_entries() {
        let (status, json) = get_json(app().await, "/search/Inception").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["title"], "Inception");
        assert_eq!(json[0]["year"], "2010");
        assert_eq!(json[0]["offers_by_category"]["Buy"][0]["provider_name"], "ExampleStore");
        assert_eq!(json[0]["offers_by_category"]["Buy"][0]["deep_link"], "https://example.com/buy");
        assert_eq!(json[0]["offers_by_category"]["Buy"][0]["label"], "$9.99 HD");
    }

    #[tokio::test]
    async fn test_search_route_no_results_is_404() {
        let (status, json) = get_json(app().await, "/search/Nothing%20Here").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("Nothing Here"));
    }

    #[test]
    fn test_error_status_mapping() {
        let extraction =
            ApiError::from(LookupError::Extraction { row: 0, field: "title", source: FieldError::Empty });
        assert_eq!(extraction.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::from(LookupError::Closed).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::from(LookupError::Driver(DriverError::Closed)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
