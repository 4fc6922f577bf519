use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::net::TcpStream;

use carisa_core::{Agent, AgentState, CoreError, NodeConfig, TcpHealth};
use carisa_discover::{DiscoverError, Discovery, MemoryDiscovery};
use carisa_model::{HealthPolicy, NodeDescriptor, NodeType};

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn policy(port: u16) -> HealthPolicy {
    HealthPolicy {
        interval_secs: 10,
        timeout_secs: 5,
        failures_before_critical: 2,
        deregister_after_minutes: 1,
        port,
    }
}

fn node(port: u16) -> NodeDescriptor {
    NodeDescriptor::new("n1", NodeType::Worker, "127.0.0.1", port, "ns")
}

/// Records the call sequence and whether the health port answered during deregister.
#[derive(Clone)]
struct Spy {
    inner: MemoryDiscovery,
    health: SocketAddr,
    calls: Arc<Mutex<Vec<String>>>,
    port_open_on_deregister: Arc<Mutex<Option<bool>>>,
}

impl Spy {
    fn new(health: SocketAddr) -> Self {
        Self {
            inner: MemoryDiscovery::new(),
            health,
            calls: Arc::default(),
            port_open_on_deregister: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Discovery for Spy {
    async fn register(
        &self,
        node: &NodeDescriptor,
        health: &HealthPolicy,
        name: &str,
    ) -> Result<(), DiscoverError> {
        self.calls.lock().unwrap().push(format!("register:{}", node.id));
        self.inner.register(node, health, name).await
    }

    async fn deregister(&self, id: &str) -> Result<(), DiscoverError> {
        self.calls.lock().unwrap().push(format!("deregister:{id}"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let open = TcpStream::connect(self.health).await.is_ok();
        *self.port_open_on_deregister.lock().unwrap() = Some(open);
        self.inner.deregister(id).await
    }
}

#[tokio::test]
async fn end_to_end_worker_lifecycle() {
    let service_port = free_port();
    let health_port = free_port();
    let health_addr: SocketAddr = format!("127.0.0.1:{health_port}").parse().unwrap();

    let dir = MemoryDiscovery::new();
    let health = TcpHealth::bind(&health_addr.to_string()).await.unwrap();
    let mut agent = Agent::new(
        node(service_port),
        policy(health_port),
        Arc::new(dir.clone()),
        Box::new(health),
    );

    agent.start().unwrap();
    agent.wait_registered().await.unwrap();

    let record = dir.lookup("n1").await.expect("n1 should be registered");
    assert_eq!(record.tags, vec!["worker".to_string()]);
    assert_eq!(record.service, "ns");
    assert_eq!(record.port, service_port);
    let check = dir.registration("n1").await.unwrap().check;
    assert_eq!(check.tcp, health_addr.to_string());
    assert!(TcpStream::connect(health_addr).await.is_ok());

    agent.stop().await;
    assert_eq!(agent.state(), AgentState::Stopped);
    assert!(dir.lookup("n1").await.is_none());
    assert!(TcpStream::connect(health_addr).await.is_err());
}

#[tokio::test]
async fn deregister_happens_while_health_port_is_open() {
    let health = TcpHealth::bind("127.0.0.1:0").await.unwrap();
    let health_addr = health.local_addr();
    let spy = Spy::new(health_addr);

    let mut agent = Agent::new(
        node(9000),
        policy(health_addr.port()),
        Arc::new(spy.clone()),
        Box::new(health),
    );
    agent.start().unwrap();
    agent.wait_registered().await.unwrap();
    agent.stop().await;

    assert_eq!(spy.calls(), vec!["register:n1", "deregister:n1"]);
    assert_eq!(*spy.port_open_on_deregister.lock().unwrap(), Some(true));
    assert!(TcpStream::connect(health_addr).await.is_err());
}

#[tokio::test]
async fn failed_registration_never_deregisters() {
    let health = TcpHealth::bind("127.0.0.1:0").await.unwrap();
    let health_addr = health.local_addr();
    let spy = Spy::new(health_addr);

    let mut bad = node(9000);
    bad.group.clear();
    let mut agent = Agent::new(
        bad,
        policy(health_addr.port()),
        Arc::new(spy.clone()),
        Box::new(health),
    );

    let err = agent.run_until(std::future::pending()).await.unwrap_err();
    assert!(matches!(err, CoreError::Discover(ref e) if e.is_config()));
    assert_eq!(spy.calls(), vec!["register:n1"]);
    assert!(TcpStream::connect(health_addr).await.is_err());
}

#[tokio::test]
async fn deregister_failure_still_closes_health_port() {
    struct Flaky;

    #[async_trait]
    impl Discovery for Flaky {
        async fn register(
            &self,
            _: &NodeDescriptor,
            _: &HealthPolicy,
            _: &str,
        ) -> Result<(), DiscoverError> {
            Ok(())
        }
        async fn deregister(&self, _: &str) -> Result<(), DiscoverError> {
            Err(DiscoverError::Rejected {
                op: "deregister",
                status: 500,
                body: "directory unavailable".into(),
            })
        }
    }

    let health = TcpHealth::bind("127.0.0.1:0").await.unwrap();
    let health_addr = health.local_addr();
    let mut agent = Agent::new(
        node(9000),
        policy(health_addr.port()),
        Arc::new(Flaky),
        Box::new(health),
    );
    agent.run_until(async {}).await.unwrap();

    assert_eq!(agent.state(), AgentState::Stopped);
    assert!(TcpStream::connect(health_addr).await.is_err());
}

#[tokio::test]
async fn unreachable_directory_aborts_startup() {
    let service_port = free_port();
    let health_port = free_port();
    let dead_directory = free_port();

    let raw = format!(
        r#"{{
            "namespace": "ns",
            "server": {{"id": "n1", "address": "127.0.0.1", "port": {service_port}}},
            "health": {{"port": {health_port}}},
            "discovery": {{"server": "127.0.0.1:{dead_directory}"}}
        }}"#
    );
    let cfg = NodeConfig::from_json(NodeType::Worker, Some(&raw), "test").unwrap();

    let mut agent = Agent::from_config(&cfg).await.unwrap();
    assert_eq!(agent.node().id, "n1");

    let err = agent.run_until(std::future::pending()).await.unwrap_err();
    assert!(matches!(err, CoreError::Discover(DiscoverError::HttpRequest(_))));
    assert_eq!(agent.state(), AgentState::Stopped);
    assert!(
        TcpStream::connect(("127.0.0.1", health_port))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn from_config_rejects_missing_health_address() {
    let raw = r#"{ "namespace": "ns", "server": {"address": ""} }"#;
    let cfg = NodeConfig::from_json(NodeType::Worker, Some(raw), "test").unwrap();

    let err = Agent::from_config(&cfg).await.err().unwrap();
    assert!(matches!(err, CoreError::Discover(ref e) if e.is_config()));
}

#[tokio::test]
async fn shutdown_is_not_held_by_unanswered_registration() {
    /// Directory that accepts the request but never answers.
    #[derive(Clone, Default)]
    struct Hung {
        deregisters: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Discovery for Hung {
        async fn register(
            &self,
            _: &NodeDescriptor,
            _: &HealthPolicy,
            _: &str,
        ) -> Result<(), DiscoverError> {
            std::future::pending::<()>().await;
            Ok(())
        }
        async fn deregister(&self, _: &str) -> Result<(), DiscoverError> {
            *self.deregisters.lock().unwrap() += 1;
            Ok(())
        }
    }

    let health = TcpHealth::bind("127.0.0.1:0").await.unwrap();
    let health_addr = health.local_addr();
    let hung = Hung::default();
    let mut agent = Agent::new(
        node(9000),
        policy(health_addr.port()),
        Arc::new(hung.clone()),
        Box::new(health),
    );

    let stopped = tokio::time::timeout(
        Duration::from_secs(3),
        agent.run_until(tokio::time::sleep(Duration::from_millis(100))),
    )
    .await;

    assert!(matches!(stopped, Ok(Ok(()))), "shutdown did not stop the agent");
    assert_eq!(agent.state(), AgentState::Stopped);
    assert!(!agent.is_registered());
    assert_eq!(*hung.deregisters.lock().unwrap(), 0);
    assert!(TcpStream::connect(health_addr).await.is_err());
}
