//! HTTP Adapter - Report and Probe Endpoints
//!
//! axum 0.7 server exposing liveness/readiness probes, the Prometheus
//! text exposition and JSON renderings of both reports.

pub mod server;

pub use server::{HttpServer, HttpState};
