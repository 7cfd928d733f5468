//! Heartbeat dispatch - turns activity snapshots into outbound POSTs.

mod body;
mod client;
mod service;

pub use body::{heartbeat_url, HeartbeatRequest, HeartbeatSchema, HEARTBEAT_PATH};
pub use client::{DeliveryOutcome, HeartbeatSink, HttpSink};
pub use service::HeartbeatService;
