#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! Wire-format types and primitives shared between the agent and the server: the
//! [`Metric`] model, its JSON envelope, request signing, and gzip framing.

pub mod error;
pub mod gzip;
pub mod metric;
pub mod sign;

pub use error::Error;
pub use metric::{Metric, MetricDto, MetricKind, any_to_f64, any_to_i64};
