use std::io;

use thiserror::Error;

/// Top-level error type for ntpdial.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Invalid invocation: no targets, unknown network, bad log level.
    #[error("configuration: {0}")]
    Config(String),
    /// Host or port could not be resolved under the configured network.
    #[error("resolve: {0}")]
    Resolve(String),
    /// The UDP socket could not be bound or connected.
    #[error("transport: {0}")]
    Transport(#[source] io::Error),
    /// The NTP exchange failed: timeout, malformed or refused response.
    #[error("protocol: {0}")]
    Protocol(String),
    /// Anything outside the categories above, only raised at the process boundary.
    #[error("fault: {0}")]
    Fault(String),
}

impl ProbeError {
    /// Taxonomy name carried in the `error_kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Config(_) => "ConfigurationError",
            ProbeError::Resolve(_) => "AddressResolutionError",
            ProbeError::Transport(_) => "TransportCreationError",
            ProbeError::Protocol(_) => "ProtocolError",
            ProbeError::Fault(_) => "UnrecoverableFault",
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}
