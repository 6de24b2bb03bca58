//! UDP transport factory handed to the NTP query operation.
//!
//! A dialer is invoked once per exchange attempt, possibly several times for
//! one logical query. It carries only its network family, so calls never
//! influence each other.

use std::future::Future;

use tokio::net::UdpSocket;
use tracing::info;

use crate::adapters::resolver::{Endpoints, resolve_endpoints};
use crate::domain::ntp::Network;
use crate::error::ProbeError;

/// Opens a connected UDP socket for one request/response exchange.
pub trait Dial {
    /// `local_address` may be empty to let the OS pick the source address.
    fn dial(
        &self,
        local_address: &str,
        remote_address: &str,
    ) -> impl Future<Output = Result<UdpSocket, ProbeError>>;
}

/// Dialer resolving both endpoints under a fixed [`Network`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UdpDialer {
    network: Network,
}

impl UdpDialer {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Resolve without creating a socket.
    pub async fn resolve(
        &self,
        local_address: &str,
        remote_address: &str,
    ) -> Result<Endpoints, ProbeError> {
        resolve_endpoints(self.network, local_address, remote_address).await
    }
}

impl Dial for UdpDialer {
    async fn dial(
        &self,
        local_address: &str,
        remote_address: &str,
    ) -> Result<UdpSocket, ProbeError> {
        let endpoints = self.resolve(local_address, remote_address).await?;

        let laddr = endpoints
            .local
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        info!(
            network = %self.network,
            laddr = %laddr,
            raddr = %endpoints.remote,
            "dialing"
        );

        let socket = UdpSocket::bind(endpoints.bind_addr())
            .await
            .map_err(ProbeError::Transport)?;
        socket
            .connect(endpoints.remote)
            .await
            .map_err(ProbeError::Transport)?;
        Ok(socket)
    }
}
