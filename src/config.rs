//! Validated settings for one invocation.

use std::time::Duration;

use crate::cli::args::Args;
use crate::domain::ntp::{FailurePolicy, Network, Target};
use crate::error::ProbeError;
use crate::services::run::RunOptions;

#[derive(Clone, Debug)]
pub struct Settings {
    pub targets: Vec<Target>,
    pub network: Network,
    pub local_address: Option<String>,
    pub timeout: Duration,
    pub policy: FailurePolicy,
}

impl Settings {
    /// Check every argument before any network activity.
    pub fn from_args(args: &Args) -> Result<Self, ProbeError> {
        if args.targets.is_empty() {
            return Err(ProbeError::Config("no server specified".into()));
        }
        let targets: Vec<Target> = args.targets.iter().map(|t| Target::new(t)).collect();

        let network: Network = args.network.parse()?;

        if !args.timeout.is_finite() || args.timeout <= 0.0 {
            return Err(ProbeError::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                args.timeout
            )));
        }

        let local_address = args
            .local_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Settings {
            targets,
            network,
            local_address,
            timeout: Duration::from_secs_f64(args.timeout),
            policy: if args.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            },
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            network: self.network,
            policy: self.policy,
        }
    }
}
