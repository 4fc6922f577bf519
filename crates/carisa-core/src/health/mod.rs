mod error;
pub use error::HealthError;

mod tcp;
pub use tcp::TcpHealth;

use async_trait::async_trait;

/// Lifecycle of a health listener. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unstarted,
    Running,
    Stopped,
}

/// Liveness endpoint probed by the discovery directory.
#[async_trait]
pub trait Health: Send {
    /// Start answering probes in a background task.
    fn run(&mut self) -> Result<(), HealthError>;

    /// Stop answering probes and release the socket. Safe to call repeatedly.
    async fn stop(&mut self);

    fn state(&self) -> HealthState;
}
