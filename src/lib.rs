//! ntpdial library: family-aware UDP dialing and sequential NTP queries.

pub mod adapters;
pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
mod error;
pub mod fmt;
pub mod logging;
pub mod services;

pub use adapters::dialer::{Dial, UdpDialer};
pub use adapters::ntp_client::{NtpQuery, SntpClient};
pub use cli::args::Args;
pub use config::Settings;
pub use domain::ntp::{FailurePolicy, Network, Response, Target};
pub use error::ProbeError;
pub use services::query::query_one;
pub use services::run::{ProcessOutcome, RunOptions, TargetReport, run};
