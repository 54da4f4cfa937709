use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Discriminant carried on the wire; mirrors the two variants of [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl std::str::FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Gauge => f.write_str("gauge"),
            MetricKind::Counter => f.write_str("counter"),
        }
    }
}

/// A single sample. The exactly-one-of-value/delta invariant is enforced by construction
/// rather than checked at runtime: there is no state a `Metric` can be in that violates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MetricDto", into = "MetricDto")]
pub enum Metric {
    Gauge { id: String, value: f64 },
    Counter { id: String, delta: i64 },
}

impl Metric {
    pub fn id(&self) -> &str {
        match self {
            Metric::Gauge { id, .. } | Metric::Counter { id, .. } => id,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Gauge { .. } => MetricKind::Gauge,
            Metric::Counter { .. } => MetricKind::Counter,
        }
    }

    /// Renders the stored value the way `GET /value/...` does: integers without a decimal
    /// point, floats with Rust's default `Display` formatting.
    pub fn value_text(&self) -> String {
        match self {
            Metric::Gauge { value, .. } => format!("{value}"),
            Metric::Counter { delta, .. } => format!("{delta}"),
        }
    }

    /// Merges `incoming` onto `self`, where `self` is the value already in the store for
    /// this id. Gauges are last-writer-wins; counters sum only when both sides agree on
    /// type, matching the ingest rule in the wire contract.
    pub fn merge(&self, incoming: Metric) -> Metric {
        match (self, incoming) {
            (Metric::Counter { delta: prev, .. }, Metric::Counter { id, delta }) => {
                Metric::Counter { id, delta: prev + delta }
            }
            (_, incoming) => incoming,
        }
    }
}

/// The JSON envelope used on the wire. `value`/`delta` are optional here because the
/// discriminant alone does not guarantee the matching field was sent; validation happens
/// in the `TryFrom` conversion into [`Metric`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl From<Metric> for MetricDto {
    fn from(m: Metric) -> Self {
        match m {
            Metric::Gauge { id, value } => MetricDto { id, kind: MetricKind::Gauge, value: Some(value), delta: None },
            Metric::Counter { id, delta } => MetricDto { id, kind: MetricKind::Counter, value: None, delta: Some(delta) },
        }
    }
}

impl TryFrom<MetricDto> for Metric {
    type Error = Error;

    fn try_from(dto: MetricDto) -> Result<Self, Error> {
        if dto.id.is_empty() {
            return Err(Error::MissingField("id"));
        }
        match dto.kind {
            MetricKind::Gauge => {
                let value = dto.value.ok_or(Error::MissingField("value"))?;
                Ok(Metric::Gauge { id: dto.id, value })
            }
            MetricKind::Counter => {
                let delta = dto.delta.ok_or(Error::MissingField("delta"))?;
                Ok(Metric::Counter { id: dto.id, delta })
            }
        }
    }
}

/// Parses a path-parameter string into an `f64`, accepting anything Rust's numeric grammar
/// accepts.
pub fn any_to_f64(raw: &str) -> Result<f64, Error> {
    raw.trim().parse::<f64>().map_err(|_| Error::InvalidNumber(raw.to_string()))
}

/// Parses a path-parameter string into an `i64`. Accepts only a base-10 integer literal;
/// float literals such as `"1.5"` are rejected, not truncated. `u64` values that overflow
/// `i64::MAX` are rejected rather than wrapped.
pub fn any_to_i64(raw: &str) -> Result<i64, Error> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return i64::try_from(u).map_err(|_| Error::IntegerOverflow(raw.to_string()));
    }
    Err(Error::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_dto_round_trips() {
        let m = Metric::Gauge { id: "load".into(), value: 2.25 };
        let json = serde_json::to_string(&m).unwrap();
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn counter_dto_round_trips() {
        let m = Metric::Counter { id: "hits".into(), delta: 8 };
        let json = serde_json::to_string(&m).unwrap();
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn counter_dto_missing_delta_is_rejected() {
        let err = serde_json::from_str::<Metric>(r#"{"id":"x","type":"counter"}"#).unwrap_err();
        assert!(err.to_string().contains("delta") || err.to_string().contains("missing required field"));
    }

    #[test]
    fn merge_sums_counters() {
        let prev = Metric::Counter { id: "hits".into(), delta: 5 };
        let incoming = Metric::Counter { id: "hits".into(), delta: 3 };
        assert_eq!(prev.merge(incoming), Metric::Counter { id: "hits".into(), delta: 8 });
    }

    #[test]
    fn merge_overwrites_gauges() {
        let prev = Metric::Gauge { id: "load".into(), value: 1.5 };
        let incoming = Metric::Gauge { id: "load".into(), value: 2.25 };
        assert_eq!(prev.merge(incoming), Metric::Gauge { id: "load".into(), value: 2.25 });
    }

    #[test]
    fn merge_type_migration_replaces_outright() {
        let prev = Metric::Counter { id: "x".into(), delta: 5 };
        let incoming = Metric::Gauge { id: "x".into(), value: 9.0 };
        assert_eq!(prev.merge(incoming), Metric::Gauge { id: "x".into(), value: 9.0 });
    }

    #[test]
    fn any_to_i64_rejects_u64_overflow() {
        let raw = format!("{}", u64::MAX);
        assert!(any_to_i64(&raw).is_err());
    }

    #[test]
    fn any_to_i64_rejects_float_literals() {
        assert!(any_to_i64("3.9").is_err());
    }
}
