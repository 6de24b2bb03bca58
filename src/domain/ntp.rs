use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ProbeError;

/// Address family used for every resolution and socket of one invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Network {
    /// Family-agnostic, IPv4 preferred.
    Udp,
    Udp4,
    #[default]
    Udp6,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            other => Err(ProbeError::Config(format!(
                "unknown network '{other}' (expected udp, udp4 or udp6)"
            ))),
        }
    }
}

/// What the orchestrator does after a target fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure.
    FailFast,
    /// Attempt every target, report failures in the exit code.
    #[default]
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail-fast"),
            FailurePolicy::Continue => f.write_str("continue"),
        }
    }
}

/// Server address as given on the command line.
///
/// The text is handed to the dialer untouched; a malformed host or port is
/// reported when that one target is queried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub name: String,
}

impl Target {
    pub fn new(input: &str) -> Self {
        Target {
            name: input.trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Leap second warning carried in the first two bits of a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapIndicator {
    NoWarning,
    AddSecond,
    DelSecond,
    NotInSync,
}

impl LeapIndicator {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::AddSecond,
            2 => LeapIndicator::DelSecond,
            _ => LeapIndicator::NotInSync,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeapIndicator::NoWarning => "no_warning",
            LeapIndicator::AddSecond => "add_second",
            LeapIndicator::DelSecond => "del_second",
            LeapIndicator::NotInSync => "not_in_sync",
        }
    }
}

/// Metrics derived from one server response.
#[derive(Clone, Debug)]
pub struct Response {
    /// Server transmit time.
    pub time: DateTime<Utc>,
    pub rtt: Duration,
    /// Positive when the local clock is behind the server.
    pub clock_offset: TimeDelta,
    pub precision: Duration,
    pub stratum: u8,
    pub reference_id: u32,
    pub reference_time: DateTime<Utc>,
    pub root_delay: Duration,
    pub root_dispersion: Duration,
    pub root_distance: Duration,
    pub leap: LeapIndicator,
    pub poll: Duration,
    pub min_error: Duration,
    /// Four-letter code, only set when stratum is 0.
    pub kiss_code: Option<String>,
}

impl Response {
    /// Reference identifier rendered the way ntpq does: ASCII for stratum 0/1,
    /// dotted quad otherwise.
    pub fn reference_id_string(&self) -> String {
        let bytes = self.reference_id.to_be_bytes();
        if self.stratum <= 1 {
            ascii_code(&bytes)
        } else {
            format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }
}

pub(crate) fn ascii_code(bytes: &[u8; 4]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| if b.is_ascii_graphic() { *b as char } else { '?' })
        .collect()
}
