//! Credential/session services: an HTTP gateway in front of an
//! authentication service that owns the user store and issues tokens.

pub mod app;
pub mod auth;
pub mod config;
pub mod gateway;
pub mod rpc;
pub mod state;
pub mod telemetry;
