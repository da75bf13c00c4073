//! roachwatch HTTP gateway
//!
//! Hosts the detection endpoint, the health probe, the browser client and,
//! for local storage, the stored images.

pub mod control_ui;
pub mod detect;
pub mod detector;
pub mod health_api;
pub mod server;

pub use detector::Detector;
pub use server::{build_router, start_server, GatewayOptions, GatewayState};
