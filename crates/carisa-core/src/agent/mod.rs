use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use carisa_discover::{ConsulDiscovery, DiscoverError, Discovery, health_address};
use carisa_model::{HealthPolicy, NodeDescriptor};

use crate::{
    config::NodeConfig,
    error::CoreError,
    health::{Health, TcpHealth},
};

/// Lifecycle of an [`Agent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Built,
    Started,
    Stopped,
}

enum Registration {
    Idle,
    Pending(JoinHandle<Result<(), DiscoverError>>),
    Registered,
    Failed,
    Deregistered,
}

/// Node agent: keeps this node discoverable and probe-able while it runs.
///
/// `start` runs the health listener and spawns registration; `stop`
/// deregisters and only then closes the health port, so the directory
/// never polls a dead port for a node it still lists.
pub struct Agent {
    node: NodeDescriptor,
    policy: HealthPolicy,
    discovery: Arc<dyn Discovery>,
    health: Box<dyn Health>,
    state: AgentState,
    registration: Registration,
}

impl Agent {
    pub fn new(
        node: NodeDescriptor,
        policy: HealthPolicy,
        discovery: Arc<dyn Discovery>,
        health: Box<dyn Health>,
    ) -> Self {
        Self {
            node,
            policy,
            discovery,
            health,
            state: AgentState::Built,
            registration: Registration::Idle,
        }
    }

    /// Wire a Consul client and a bound TCP health listener from `cfg`.
    pub async fn from_config(cfg: &NodeConfig) -> Result<Self, CoreError> {
        let node = cfg.descriptor();
        let policy = cfg.health_policy();

        let discovery = ConsulDiscovery::new(&cfg.discovery)?;
        info!(endpoint = discovery.endpoint(), "discovery client ready");

        let health = TcpHealth::bind(&health_address(&node, &policy)?).await?;
        Ok(Self::new(node, policy, Arc::new(discovery), Box::new(health)))
    }

    pub fn node(&self) -> &NodeDescriptor {
        &self.node
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.registration, Registration::Registered)
    }

    /// Run the health listener, then register in a spawned task.
    ///
    /// Returns as soon as registration is spawned; use
    /// [`wait_registered`](Self::wait_registered) for its outcome.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.state != AgentState::Built {
            return Err(CoreError::InvalidState {
                op: "start",
                state: self.state,
            });
        }
        self.health.run()?;

        let discovery = Arc::clone(&self.discovery);
        let node = self.node.clone();
        let policy = self.policy.clone();
        let task = tokio::spawn(async move {
            info!(
                id = %node.id,
                node_type = %node.node_type,
                address = %node.address,
                port = node.port,
                "starting node agent"
            );
            discovery.register(&node, &policy, &node.group).await?;
            info!(id = %node.id, "node agent started");
            Ok::<(), DiscoverError>(())
        });

        self.registration = Registration::Pending(task);
        self.state = AgentState::Started;
        Ok(())
    }

    /// Wait for the registration spawned by [`start`](Self::start).
    ///
    /// Cancel safe: dropping the future leaves the registration pending.
    pub async fn wait_registered(&mut self) -> Result<(), CoreError> {
        let outcome = match &mut self.registration {
            Registration::Pending(task) => task.await,
            Registration::Registered => return Ok(()),
            Registration::Failed => return Err(CoreError::NotRegistered(self.node.id.clone())),
            Registration::Idle | Registration::Deregistered => {
                return Err(CoreError::InvalidState {
                    op: "wait for registration of",
                    state: self.state,
                });
            }
        };
        self.settle(outcome)
    }

    fn settle(
        &mut self,
        outcome: Result<Result<(), DiscoverError>, JoinError>,
    ) -> Result<(), CoreError> {
        match outcome {
            Ok(Ok(())) => {
                self.registration = Registration::Registered;
                Ok(())
            }
            Ok(Err(e)) => {
                self.registration = Registration::Failed;
                Err(e.into())
            }
            Err(e) => {
                self.registration = Registration::Failed;
                Err(CoreError::RegistrationTask(e.to_string()))
            }
        }
    }

    /// Deregister, then stop the health listener. No-op unless started.
    ///
    /// A registration still in flight is aborted and counts as failed;
    /// deregistration is issued only after a successful registration.
    /// Deregistration failures are logged, never returned.
    pub async fn stop(&mut self) {
        if self.state != AgentState::Started {
            return;
        }
        info!(id = %self.node.id, address = %self.node.address, "stopping node agent");

        if let Registration::Pending(task) = &mut self.registration {
            // No-op on a finished task, whose outcome is kept.
            task.abort();
            let outcome = task.await;
            if matches!(&outcome, Err(e) if e.is_cancelled()) {
                self.registration = Registration::Failed;
                warn!(
                    id = %self.node.id,
                    deregister_after = %self.policy.deregister_after(),
                    "registration still pending at stop, the directory reaps any record after deregister-critical-after"
                );
            } else if let Err(e) = self.settle(outcome) {
                warn!(id = %self.node.id, error = %e, "registration did not complete before stop");
            }
        }

        if self.is_registered() {
            match self.discovery.deregister(&self.node.id).await {
                Ok(()) => self.registration = Registration::Deregistered,
                Err(e) => error!(
                    id = %self.node.id,
                    error = %e,
                    "the discovery client cannot deregister the node"
                ),
            }
        }

        self.health.stop().await;
        self.state = AgentState::Stopped;
        info!(id = %self.node.id, "node agent stopped");
    }

    /// Start, serve until `shutdown` resolves, then stop.
    ///
    /// A failed registration stops the health listener and is returned;
    /// the caller is expected to abort the process.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), CoreError>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        tokio::pin!(shutdown);

        let registered = tokio::select! {
            res = self.wait_registered() => Some(res),
            _ = &mut shutdown => None,
        };

        match registered {
            Some(Err(e)) => {
                self.health.stop().await;
                self.state = AgentState::Stopped;
                return Err(e);
            }
            Some(Ok(())) => shutdown.await,
            None => info!(id = %self.node.id, "shutdown requested during startup"),
        }

        self.stop().await;
        Ok(())
    }
}
