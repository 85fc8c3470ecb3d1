// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request logging middleware.
//!
//! One line at request start and one at completion, keyed by a short random
//! request id, with the elapsed time in milliseconds.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;
use uuid::Uuid;

pub async fn request_logger(request: Request, next: Next) -> Response {
    let rid = short_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "localhost".to_string());

    info!(%rid, %method, %path, %client, "start request");
    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        %rid,
        status = response.status().as_u16(),
        completed_in = %format!("{elapsed_ms:.2}ms"),
        "end request"
    );
    response
}

fn short_request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(6);
    id.to_uppercase()
}
