use serde::Serialize;
use std::time::Duration;

use crate::domain::ntp::{LeapIndicator, Response};
use crate::error::ProbeError;

/// Flat, millisecond-based view of a [`Response`] for the log stream.
///
/// The round trip is carried by the enclosing record as `rtt_ms`.
#[derive(Serialize)]
pub struct JsonResponse {
    pub time: String,
    pub clock_offset_ms: f64,
    pub precision_ms: f64,
    pub stratum: u8,
    pub reference_id: String,
    pub reference_time: String,
    pub root_delay_ms: f64,
    pub root_dispersion_ms: f64,
    pub root_distance_ms: f64,
    pub leap: LeapIndicator,
    pub poll_ms: f64,
    pub min_error_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiss_code: Option<String>,
}

pub fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

pub fn offset_millis(r: &Response) -> f64 {
    match r.clock_offset.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => r.clock_offset.num_milliseconds() as f64,
    }
}

impl From<&Response> for JsonResponse {
    fn from(r: &Response) -> Self {
        JsonResponse {
            time: r.time.to_rfc3339(),
            clock_offset_ms: offset_millis(r),
            precision_ms: millis(r.precision),
            stratum: r.stratum,
            reference_id: r.reference_id_string(),
            reference_time: r.reference_time.to_rfc3339(),
            root_delay_ms: millis(r.root_delay),
            root_dispersion_ms: millis(r.root_dispersion),
            root_distance_ms: millis(r.root_distance),
            leap: r.leap,
            poll_ms: millis(r.poll),
            min_error_ms: millis(r.min_error),
            kiss_code: r.kiss_code.clone(),
        }
    }
}

/// Serialize a response into a compact JSON string.
pub fn response_to_json(r: &Response) -> Result<String, ProbeError> {
    serde_json::to_string(&JsonResponse::from(r)).map_err(|e| ProbeError::Fault(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};

    #[test]
    fn renders_milliseconds_and_signed_offset() {
        let r = Response {
            time: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            rtt: Duration::from_millis(12),
            clock_offset: TimeDelta::microseconds(-2_500),
            precision: Duration::from_micros(1),
            stratum: 1,
            reference_id: u32::from_be_bytes(*b"PPS\0"),
            reference_time: DateTime::<Utc>::from_timestamp(1_699_999_990, 0).unwrap(),
            root_delay: Duration::ZERO,
            root_dispersion: Duration::from_millis(1),
            root_distance: Duration::from_millis(7),
            leap: LeapIndicator::NoWarning,
            poll: Duration::from_secs(64),
            min_error: Duration::ZERO,
            kiss_code: None,
        };
        let text = response_to_json(&r).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(v.get("rtt_ms").is_none());
        assert_eq!(v["root_distance_ms"], 7.0);
        assert_eq!(v["clock_offset_ms"], -2.5);
        assert_eq!(v["reference_id"], "PPS");
        assert_eq!(v["leap"], "no_warning");
        assert!(v.get("kiss_code").is_none());
    }
}
