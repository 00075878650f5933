use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::snapshot::Collector;

mod models;

/// Serves the snapshot. The engine is synchronous, so assembly runs on the
/// blocking pool; a panicked assembly task surfaces as a structured 500
/// instead of a partial body.
async fn host_snapshot(State(collector): State<Arc<Collector>>) -> Response {
    let result = tokio::task::spawn_blocking(move || collector.collect()).await;
    match result {
        Ok(snapshot) => {
            let body = models::HostSnapshot::from(snapshot);
            (axum::http::StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            log::error!("host snapshot assembly failed: {err}");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "failed to assemble host snapshot",
            )
                .into_response()
        }
    }
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(collector: Arc<Collector>) -> Self {
        let router = axum::Router::new()
            .route("/host", get(host_snapshot))
            .with_state(collector);
        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("TCP Listener bind");
        axum::serve(listener, self.router.into_make_service())
            .await
            .unwrap()
    }
}
