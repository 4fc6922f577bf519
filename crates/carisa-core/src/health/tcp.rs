use std::{io, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use tokio::{
    net::{TcpListener, lookup_host},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::health::{Health, HealthError, HealthState};

/// Pause after a failed accept; persistent errors such as EMFILE would spin otherwise.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP liveness listener.
///
/// A completed handshake is the whole protocol: every accepted connection
/// is closed immediately without reading or writing.
pub struct TcpHealth {
    addr: SocketAddr,
    listener: Option<TcpListener>,
    task: Option<JoinHandle<()>>,
    token: CancellationToken,
    state: HealthState,
}

impl TcpHealth {
    /// Resolve `address` (`host:port`) and bind the listening socket.
    pub async fn bind(address: &str) -> Result<Self, HealthError> {
        let addr = resolve(address).await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HealthError::Bind {
                address: address.to_string(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| HealthError::Bind {
            address: address.to_string(),
            source,
        })?;

        info!(address = %addr, "health listener bound");
        Ok(Self {
            addr,
            listener: Some(listener),
            task: None,
            token: CancellationToken::new(),
            state: HealthState::Unstarted,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Health for TcpHealth {
    fn run(&mut self) -> Result<(), HealthError> {
        let listener = match (self.state, self.listener.take()) {
            (HealthState::Unstarted, Some(listener)) => listener,
            (state, listener) => {
                self.listener = listener;
                return Err(HealthError::InvalidState(state));
            }
        };

        self.task = Some(tokio::spawn(accept_loop(listener, self.token.clone())));
        self.state = HealthState::Running;
        info!(address = %self.addr, "health listener started");
        Ok(())
    }

    async fn stop(&mut self) {
        if self.state == HealthState::Stopped {
            return;
        }
        self.token.cancel();
        self.listener.take();

        // The accept loop owns the socket; joining it means the port is closed.
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(address = %self.addr, error = %e, "health accept loop did not finish cleanly");
        }
        self.state = HealthState::Stopped;
        info!(address = %self.addr, "health listener stopped");
    }

    fn state(&self) -> HealthState {
        self.state
    }
}

impl Drop for TcpHealth {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn resolve(address: &str) -> Result<SocketAddr, HealthError> {
    let addrs: Vec<SocketAddr> = lookup_host(address)
        .await
        .map_err(|source| HealthError::Resolve {
            address: address.to_string(),
            source,
        })?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| HealthError::Resolve {
            address: address.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        })
}

async fn accept_loop(listener: TcpListener, token: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    trace!(peer = %peer, "health probe accepted");
                    drop(stream);
                }
                // Accept interrupted by our own shutdown.
                Err(_) if token.is_cancelled() => break,
                Err(e) => {
                    error!(error = %e, "health listener cannot accept connection");
                    if !backoff(&token).await {
                        break;
                    }
                }
            },
        }
    }
    debug!("health accept loop finished");
}

/// Sleep [`ACCEPT_BACKOFF`]; `false` if cancelled meanwhile.
async fn backoff(token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => true,
    }
}
