#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! The agent's collection and delivery pipeline: three independent samplers, a
//! single-slot mailbox per sampler, a dispatcher that drains them on a report cadence,
//! and a bounded pool of sender workers with retry/backoff.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod mailbox;
pub mod poll_counter;
pub mod samplers;
pub mod sender;

pub use config::AgentConfig;
pub use engine::{AgentHandle, start_agent};
pub use poll_counter::PollCounter;
pub use sender::SendOutcome;

#[cfg(test)]
use wiremock as _;
