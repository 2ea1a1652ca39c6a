#![allow(clippy::unwrap_used)]
// Session lifecycle tests against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use valo_core::{CoreError, DeviceCache, GatewayConfig, SessionManager, SessionPhase};
use valo_gateway::{
    DeviceId, DeviceInfo, Error as GatewayError, FailurePoint, GatewayTransport, GroupId,
    GroupInfo, Identity, LightOperation, SimulatedGateway, TopologyStream,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> GatewayConfig {
    GatewayConfig::new("simulated", SecretString::from("code"))
}

fn manager_with(sim: &Arc<SimulatedGateway>, config: GatewayConfig) -> SessionManager {
    let cache = Arc::new(DeviceCache::new(config.super_group_name.clone()));
    SessionManager::new(config, sim.clone(), cache)
}

fn manager(sim: &Arc<SimulatedGateway>) -> SessionManager {
    manager_with(sim, config())
}

fn slow_gateway() -> Arc<SimulatedGateway> {
    Arc::new(SimulatedGateway::with_demo_topology().with_latency(Duration::from_millis(25)))
}

/// Rejects pairing and never finishes closing.
struct StuckOnClose;

#[async_trait]
impl GatewayTransport for StuckOnClose {
    fn address(&self) -> &str {
        "10.0.0.9"
    }

    async fn authenticate(&self, _code: &SecretString) -> Result<Identity, GatewayError> {
        Err(GatewayError::Authentication {
            message: "rejected".into(),
        })
    }

    async fn connect(&self, _identity: &Identity) -> Result<(), GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn observe_groups(&self) -> Result<TopologyStream<GroupInfo>, GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn observe_devices(&self) -> Result<TopologyStream<DeviceInfo>, GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn send_group_command(
        &self,
        _group: GroupId,
        _op: &LightOperation,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn send_device_command(
        &self,
        _device: DeviceId,
        _op: &LightOperation,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn rename_group(&self, _group: GroupId, _name: &str) -> Result<(), GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn rename_device(&self, _device: DeviceId, _name: &str) -> Result<(), GatewayError> {
        Err(GatewayError::Closed)
    }

    async fn close(&self) -> Result<(), GatewayError> {
        std::future::pending().await
    }
}

// ── Initialization ──────────────────────────────────────────────────

#[tokio::test]
async fn starts_uninitialized_and_lazily_connects() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
    assert_eq!(sim.authenticate_calls(), 0);

    let session = sessions.acquire().await.unwrap();
    assert_eq!(session.generation(), 1);
    assert_eq!(session.identity(), "valo-sim-1");
    assert!(session.is_open());
    assert_eq!(sessions.state(), SessionPhase::Ready);
    assert!(sim.is_connected());

    // Remote is not a light.
    assert_eq!(sessions.cache().bulb_count(), 3);
    assert_eq!(sessions.cache().group_count(), 3);
}

#[tokio::test]
async fn ready_session_is_reused() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    let first = sessions.acquire().await.unwrap();
    let second = sessions.acquire().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(sim.authenticate_calls(), 1);
    assert_eq!(sim.connect_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquires_share_one_initialization() {
    let sim = slow_gateway();
    let sessions = manager(&sim);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let sessions = sessions.clone();
            tokio::spawn(async move { sessions.acquire().await })
        })
        .collect();

    for handle in handles {
        let session = handle.await.unwrap().unwrap();
        assert_eq!(session.generation(), 1);
    }
    assert_eq!(sim.authenticate_calls(), 1);
    assert_eq!(sim.connect_calls(), 1);
    assert_eq!(sessions.generation(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_share_a_failure() {
    let sim = slow_gateway();
    sim.fail_once(FailurePoint::Connect);
    let sessions = manager(&sim);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sessions = sessions.clone();
            tokio::spawn(async move { sessions.acquire().await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(
            matches!(result, Err(CoreError::ConnectionFailed { .. })),
            "{result:?}"
        );
    }
    assert_eq!(sim.authenticate_calls(), 1);
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);

    // The next call starts over and succeeds.
    let session = sessions.acquire().await.unwrap();
    assert_eq!(session.generation(), 2);
    assert_eq!(sim.authenticate_calls(), 2);
}

#[tokio::test]
async fn authentication_failure_is_reported_with_address() {
    let sim = Arc::new(
        SimulatedGateway::with_demo_topology()
            .with_security_code("right")
            .with_address("10.0.0.7"),
    );
    let sessions = manager(&sim);
    match sessions.acquire().await {
        Err(CoreError::ConnectionFailed { address, reason }) => {
            assert_eq!(address, "10.0.0.7");
            assert!(reason.contains("security code rejected"), "{reason}");
        }
        other => panic!("expected ConnectionFailed, got {other:?}"),
    }
    assert_eq!(sim.connect_calls(), 0);
}

#[tokio::test]
async fn topology_failure_releases_the_connection() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    sim.fail_once(FailurePoint::Topology);
    let sessions = manager(&sim);

    let result = sessions.acquire().await;
    assert!(matches!(result, Err(CoreError::ConnectionFailed { .. })));
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
    assert!(!sim.is_connected());
    assert_eq!(sim.close_calls(), 1);
    assert_eq!(sessions.cache().bulb_count(), 0);
}

#[tokio::test]
async fn slow_setup_times_out() {
    let sim = Arc::new(
        SimulatedGateway::with_demo_topology().with_latency(Duration::from_millis(200)),
    );
    let sessions = manager_with(
        &sim,
        config().with_connect_timeout(Duration::from_millis(50)),
    );

    let result = sessions.acquire().await;
    assert!(
        matches!(result, Err(CoreError::Timeout { .. })),
        "{result:?}"
    );
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_waiter_does_not_abort_initialization() {
    let sim = slow_gateway();
    let sessions = manager(&sim);

    let gave_up = tokio::time::timeout(Duration::from_millis(5), sessions.acquire()).await;
    assert!(gave_up.is_err());

    let session = sessions.acquire().await.unwrap();
    assert_eq!(session.generation(), 1);
    assert_eq!(sim.authenticate_calls(), 1);
}

// ── Teardown ────────────────────────────────────────────────────────

#[tokio::test]
async fn dispose_is_idempotent() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    let session = sessions.acquire().await.unwrap();

    sessions.dispose().await;
    sessions.dispose().await;

    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
    assert!(!session.is_open());
    assert!(!sim.is_connected());
    assert_eq!(sim.close_calls(), 1);
}

#[tokio::test]
async fn dispose_without_session_is_a_no_op() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    sessions.dispose().await;
    assert_eq!(sim.close_calls(), 0);
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispose_waits_for_pending_initialization() {
    let sim = slow_gateway();
    let sessions = manager(&sim);

    let pending = {
        let sessions = sessions.clone();
        tokio::spawn(async move { sessions.acquire().await })
    };
    while sessions.state() != SessionPhase::Initializing {
        tokio::task::yield_now().await;
    }

    sessions.dispose().await;
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);
    assert_eq!(sim.close_calls(), 1);

    let session = pending.await.unwrap().unwrap();
    assert!(!session.is_open());
}

#[tokio::test]
async fn stale_invalidation_is_ignored() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);

    let stale = sessions.acquire().await.unwrap();
    sessions.invalidate(&stale).await;
    let live = sessions.acquire().await.unwrap();
    assert_eq!(live.generation(), 2);

    sessions.invalidate(&stale).await;
    assert_eq!(sessions.state(), SessionPhase::Ready);
    assert!(live.is_open());
    assert_eq!(sim.close_calls(), 1);
}

#[tokio::test]
async fn closed_session_rejects_commands() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    let session = sessions.acquire().await.unwrap();
    sessions.dispose().await;

    let result = session
        .send_device_command(65537, &LightOperation::switch(true))
        .await;
    assert!(matches!(result, Err(CoreError::CommandFailed { .. })));
    assert_eq!(sim.device_command_calls(), 0);
}

#[tokio::test]
async fn slow_command_times_out() {
    let sim = Arc::new(
        SimulatedGateway::with_demo_topology().with_latency(Duration::from_millis(100)),
    );
    let sessions = manager_with(
        &sim,
        config().with_command_timeout(Duration::from_millis(20)),
    );
    let session = sessions.acquire().await.unwrap();
    let result = session
        .send_group_command(131_074, &LightOperation::switch(false))
        .await;
    assert!(
        matches!(result, Err(CoreError::Timeout { .. })),
        "{result:?}"
    );
}

#[tokio::test]
async fn hanging_close_after_failed_setup_does_not_wedge_the_manager() {
    let config = config()
        .with_connect_timeout(Duration::from_millis(50))
        .with_command_timeout(Duration::from_millis(50));
    let cache = Arc::new(DeviceCache::new(config.super_group_name.clone()));
    let sessions = SessionManager::new(config, Arc::new(StuckOnClose), cache);

    let result = tokio::time::timeout(Duration::from_secs(2), sessions.acquire())
        .await
        .expect("acquire must not hang");
    match result {
        Err(CoreError::ConnectionFailed { address, .. }) => assert_eq!(address, "10.0.0.9"),
        other => panic!("expected ConnectionFailed, got {other:?}"),
    }
    assert_eq!(sessions.state(), SessionPhase::Uninitialized);

    tokio::time::timeout(Duration::from_secs(2), sessions.dispose())
        .await
        .expect("dispose must not hang");
}

#[tokio::test]
async fn lost_connection_is_a_connection_failure() {
    let sim = Arc::new(SimulatedGateway::with_demo_topology());
    let sessions = manager(&sim);
    let session = sessions.acquire().await.unwrap();

    // The gateway drops the connection under a live session.
    sim.close().await.unwrap();

    let result = session
        .send_device_command(65537, &LightOperation::switch(true))
        .await;
    match result {
        Err(CoreError::ConnectionFailed { address, .. }) => assert_eq!(address, "simulated"),
        other => panic!("expected ConnectionFailed, got {other:?}"),
    }
    assert_eq!(sim.device_command_calls(), 1);
}
