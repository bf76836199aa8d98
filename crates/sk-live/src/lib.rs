//! sk-live
//!
//! The Live Driver (C7): a wall-clock loop around the Lifecycle Engine,
//! grounded in the teacher's `mqk-daemon` heartbeat task (`tokio::time`
//! interval loop over a `broadcast` bus) but without the HTTP surface —
//! this kernel's control plane is the Event Bus and [`sk-runtime`]'s
//! Control Surface, not a REST API.

mod config;
mod driver;
mod stop;

pub use config::LiveConfig;
pub use driver::{run, LiveRun};
pub use stop::StopHandle;
