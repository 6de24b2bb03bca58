use tracing::info;

use crate::adapters::dialer::Dial;
use crate::adapters::ntp_client::NtpQuery;
use crate::domain::ntp::{FailurePolicy, Network, Response, Target};
use crate::error::ProbeError;

use super::query::query_one;

/// Outcome of querying one target.
#[derive(Debug)]
pub struct TargetReport {
    pub target: Target,
    pub result: Result<Response, ProbeError>,
}

impl TargetReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate of all attempted targets, in the order they were queried.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    pub reports: Vec<TargetReport>,
    /// Set when fail-fast stopped before the last target.
    pub aborted: bool,
}

impl ProcessOutcome {
    pub fn attempted(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed() == 0 { 0 } else { 1 }
    }
}

/// Per-invocation knobs shared by every target.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    pub network: Network,
    pub policy: FailurePolicy,
}

/// Query every target in order, one at a time.
///
/// An empty target list is a configuration error and nothing is queried.
pub async fn run<Q, D>(
    targets: &[Target],
    options: RunOptions,
    client: &Q,
    dialer: &D,
) -> Result<ProcessOutcome, ProbeError>
where
    Q: NtpQuery,
    D: Dial,
{
    if targets.is_empty() {
        return Err(ProbeError::Config("no server specified".into()));
    }

    let mut outcome = ProcessOutcome::default();
    for (i, target) in targets.iter().enumerate() {
        let result = query_one(target, options.network, client, dialer).await;
        let failed = result.is_err();
        outcome.reports.push(TargetReport {
            target: target.clone(),
            result,
        });
        if failed && options.policy == FailurePolicy::FailFast {
            outcome.aborted = i + 1 < targets.len();
            break;
        }
    }

    info!(
        attempted = outcome.attempted(),
        succeeded = outcome.succeeded(),
        failed = outcome.failed(),
        aborted = outcome.aborted,
        policy = %options.policy,
        "query summary"
    );
    Ok(outcome)
}
