//! Admin HTTP endpoint
//!
//! Routes:
//! - `GET /preview-parse?path=<p>` - parse and resolve one storage path
//! - `GET /metrics` - Prometheus text format
//! - `GET /health` - liveness
//!
//! Uses hyper for the HTTP server. Authentication is handled upstream.

use crate::infra::metrics::{MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use crate::services::resolver::{PathPreview, PathResolver};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

const PREVIEW_PATH: &str = "/preview-parse";

const CORS_ALLOW_HEADERS: &str =
    "authorization, x-client-info, apikey, content-type, x-support-sync-secret";
const CORS_ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

#[derive(Serialize)]
struct OkBody<'a> {
    ok: bool,
    data: &'a PathPreview,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(&ErrorBody { error: message })
        .unwrap_or_else(|_| r#"{"error":"internal"}"#.to_string());
    json_response(status, body)
}

fn preflight() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
        .body(Full::new(Bytes::from("ok")))
        .expect("static response should not fail")
}

/// Query string of `GET /preview-parse`
#[derive(Debug, Default, Deserialize)]
struct PreviewQuery {
    #[serde(default)]
    path: Option<String>,
}

/// Decode the preview query; a repeated `path` is treated as missing
fn preview_query(query: Option<&str>) -> PreviewQuery {
    serde_urlencoded::from_str(query.unwrap_or("")).unwrap_or_else(|e| {
        debug!(error = %e, "preview_query_rejected");
        PreviewQuery::default()
    })
}

/// Format metrics in Prometheus text exposition format
fn format_prometheus_metrics(summary: &MetricsSummary, site: &str) -> String {
    let mut output = String::with_capacity(2048);

    let counters = [
        ("parkroute_previews_total", "Path previews resolved", summary.previews_total),
        ("parkroute_parks_matched_total", "Previews routed to a park", summary.parks_matched_total),
        (
            "parkroute_attractions_matched_total",
            "Previews matched to an attraction",
            summary.attractions_matched_total,
        ),
        (
            "parkroute_lookup_failures_total",
            "Previews aborted by a routing lookup failure",
            summary.lookup_failures_total,
        ),
    ];
    for (name, help, val) in counters {
        let _ = writeln!(output, "# HELP {name} {help}");
        let _ = writeln!(output, "# TYPE {name} counter");
        let _ = writeln!(output, "{name}{{site=\"{site}\"}} {val}");
    }

    let name = "parkroute_resolve_latency_us";
    let _ = writeln!(output, "# HELP {name} Path resolution latency in microseconds");
    let _ = writeln!(output, "# TYPE {name} histogram");
    let mut cumulative = 0u64;
    for (i, bound) in METRICS_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += summary.latency_buckets[i];
        let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += summary.latency_buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"+Inf\"}} {cumulative}");
    let _ = writeln!(output, "{name}_sum{{site=\"{site}\"}} {}", summary.latency_sum_us);
    let _ = writeln!(output, "{name}_count{{site=\"{site}\"}} {cumulative}");

    output
}

async fn handle_preview(query: Option<&str>, resolver: &PathResolver) -> Response<Full<Bytes>> {
    let path = preview_query(query).path.unwrap_or_default();
    if path.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Missing ?path=");
    }

    match resolver.preview(&path).await {
        Ok(preview) => match serde_json::to_string(&OkBody { ok: true, data: &preview }) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => {
                error!(error = %e, "preview_serialize_failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode preview")
            }
        },
        Err(e) => json_error(StatusCode::BAD_GATEWAY, &e.to_string()),
    }
}

/// Route one request
async fn route(
    method: &Method,
    path: &str,
    query: Option<&str>,
    resolver: &PathResolver,
    site_id: &str,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::OPTIONS, _) => preflight(),
        (&Method::GET, PREVIEW_PATH) => handle_preview(query, resolver).await,
        (_, PREVIEW_PATH) => json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(&resolver.metrics().snapshot(), site_id);
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail")
        }
        (&Method::GET, "/health") => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail"),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail"),
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    resolver: Arc<PathResolver>,
    site_id: Arc<String>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response =
        route(req.method(), req.uri().path(), req.uri().query(), &resolver, &site_id).await;
    Ok(response)
}

/// Start the admin HTTP server
pub async fn start_http_server(
    addr: SocketAddr,
    resolver: Arc<PathResolver>,
    site_id: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    let site_id = Arc::new(site_id);

    info!(addr = %addr, site = %site_id, "http_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let resolver = resolver.clone();
                        let site_id = site_id.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let resolver = resolver.clone();
                                let site_id = site_id.clone();
                                async move { handle_request(req, resolver, site_id).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AttractionId, ParkId};
    use crate::io::fixture_store::{FixtureStore, FixtureTables};
    use http_body_util::BodyExt;
    use uuid::Uuid;

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn resolver() -> (PathResolver, ParkId, AttractionId) {
        let park_id = ParkId(Uuid::now_v7());
        let attraction_id = AttractionId(Uuid::now_v7());
        let store = FixtureStore::from_tables(
            FixtureTables::default()
                .with_park(park_id, "Plose")
                .with_prefix("plose-plosebob", park_id, true)
                .with_camera(park_id, "2201", Some(attraction_id), true)
                .with_attraction(attraction_id, park_id, "Plose Bob"),
        )
        .unwrap();
        (PathResolver::new(Arc::new(store)), park_id, attraction_id)
    }

    #[test]
    fn test_preview_query_decoding() {
        let decode = |q| preview_query(q).path;
        assert_eq!(
            decode(Some("path=plose-plosebob%2FIMG_2201.jpg")).as_deref(),
            Some("plose-plosebob/IMG_2201.jpg")
        );
        assert_eq!(decode(Some("path=a+b%20c&x=1")).as_deref(), Some("a b c"));
        assert_eq!(decode(Some("x=1&path=%C3%BC")).as_deref(), Some("ü"));
        assert_eq!(decode(Some("x=1&path=")).as_deref(), Some(""));
        assert_eq!(decode(Some("x=1")), None);
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some("path=a&path=b")), None);
    }

    #[tokio::test]
    async fn test_preview_route_ok() {
        let (resolver, park_id, attraction_id) = resolver();
        let response = route(
            &Method::GET,
            PREVIEW_PATH,
            Some("path=plose-plosebob%2FIMG_2201.jpg"),
            &resolver,
            "test",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"]["prefix"], "plose-plosebob");
        assert_eq!(json["data"]["customerCode"], "2201");
        assert_eq!(json["data"]["matchedParkId"], park_id.to_string());
        assert_eq!(json["data"]["matchedParkName"], "Plose");
        assert_eq!(json["data"]["matchedCustomerCode"], "2201");
        assert_eq!(json["data"]["matchedAttractionId"], attraction_id.to_string());
        assert_eq!(json["data"]["matchedAttractionName"], "Plose Bob");
    }

    #[tokio::test]
    async fn test_preview_route_missing_path() {
        let (resolver, _, _) = resolver();
        for query in [None, Some("path="), Some("other=1")] {
            let response = route(&Method::GET, PREVIEW_PATH, query, &resolver, "test").await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "Missing ?path=");
        }
    }

    #[tokio::test]
    async fn test_preview_route_method_not_allowed() {
        let (resolver, _, _) = resolver();
        let response = route(&Method::POST, PREVIEW_PATH, None, &resolver, "test").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_preflight() {
        let (resolver, _, _) = resolver();
        let response = route(&Method::OPTIONS, PREVIEW_PATH, None, &resolver, "test").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Access-Control-Allow-Methods"], CORS_ALLOW_METHODS);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let (resolver, _, _) = resolver();
        route(&Method::GET, PREVIEW_PATH, Some("path=x%2Fy.jpg"), &resolver, "plose").await;

        let response = route(&Method::GET, "/metrics", None, &resolver, "plose").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("parkroute_previews_total{site=\"plose\"} 1"));
        assert!(text.contains("parkroute_resolve_latency_us_count{site=\"plose\"} 1"));

        // Scrapes leave the logged rate window alone
        route(&Method::GET, "/metrics", None, &resolver, "plose").await;
        assert!(resolver.metrics().report().previews_per_sec > 0.0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (resolver, _, _) = resolver();
        let response = route(&Method::GET, "/nope", None, &resolver, "test").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
