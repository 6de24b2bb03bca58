use tracing::{info, instrument, warn};

use crate::adapters::dialer::Dial;
use crate::adapters::ntp_client::NtpQuery;
use crate::domain::ntp::{Network, Response, Target};
use crate::error::ProbeError;
use crate::fmt::json::{millis, response_to_json};

/// Query a single target and log the attempt and its outcome.
///
/// Success is logged at info with the round trip and the JSON encoded
/// response; failure is logged once at warn with the error and its taxonomy
/// name.
#[instrument(level = "debug", skip_all, fields(server = %target))]
pub async fn query_one<Q, D>(
    target: &Target,
    network: Network,
    client: &Q,
    dialer: &D,
) -> Result<Response, ProbeError>
where
    Q: NtpQuery,
    D: Dial,
{
    info!(server = %target, network = %network, "querying server");

    match client.query(target.as_str(), dialer).await {
        Ok(response) => {
            log_response(target, &response);
            Ok(response)
        }
        Err(err) => {
            warn!(
                server = %target,
                error = %err,
                error_kind = err.kind(),
                "query failed"
            );
            Err(err)
        }
    }
}

fn log_response(target: &Target, r: &Response) {
    match response_to_json(r) {
        Ok(json) => info!(
            server = %target,
            rtt_ms = millis(r.rtt),
            response = %json,
            "server response"
        ),
        Err(err) => warn!(
            server = %target,
            rtt_ms = millis(r.rtt),
            error = %err,
            error_kind = err.kind(),
            "server response not encodable"
        ),
    }
}
