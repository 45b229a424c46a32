/*!
 * fingermatch
 * Signed fingerprint-minutiae inputs for a zero-knowledge matching circuit,
 * and the HTTP service that runs the external prover/verifier over them
 *
 * Signed-record pipeline:
 * - field: decimal wire codec for BN254 field elements
 * - hasher: Poseidon digest of a minutiae record
 * - eddsa / babyjub: EdDSA-Poseidon signatures over Baby Jubjub
 * - assembler: public/private circuit input documents
 *
 * Verification service:
 * - orchestrator: per-request workspace, merge, pipeline, classification
 * - routes: POST /api/match, GET /health
 */

pub mod assembler;
pub mod audit;
pub mod babyjub;
pub mod config;
pub mod eddsa;
pub mod error;
pub mod field;
pub mod generate;
pub mod hasher;
pub mod orchestrator;
pub mod record;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{AppState, MAX_UPLOAD_BYTES};

/// Headroom for multipart framing on top of the two files.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/match", post(routes::match_fingerprints))
        .layer(DefaultBodyLimit::max(2 * MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
