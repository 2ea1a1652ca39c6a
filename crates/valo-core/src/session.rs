// ── Gateway session lifecycle ──
//
// At most one live session per manager. Initialization runs on a spawned
// task and publishes its outcome on a watch channel, so every concurrent
// caller observes the same session or the same failure, and a caller
// that gives up waiting never aborts the setup others depend on.
// Teardown follows the same pattern.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use futures_util::future::try_join;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use valo_gateway::{
    self as gateway, CommandTarget, DeviceId, GatewayTransport, LightOperation, TopologyStream,
};

use crate::config::GatewayConfig;
use crate::convert::bulb_from_device;
use crate::error::CoreError;
use crate::model::{GroupId, GroupRecord};
use crate::store::DeviceCache;

/// Lifecycle phase of the managed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Ready,
    Disposing,
}

#[derive(Debug, Clone)]
enum InitFailure {
    TimedOut { timeout_secs: u64 },
    Failed { reason: String },
}

type InitOutcome = Result<Arc<Session>, InitFailure>;

enum Slot {
    Uninitialized,
    Initializing(watch::Receiver<Option<InitOutcome>>),
    Ready(Arc<Session>),
    Disposing(watch::Receiver<bool>),
}

impl Slot {
    fn phase(&self) -> SessionPhase {
        match self {
            Self::Uninitialized => SessionPhase::Uninitialized,
            Self::Initializing(_) => SessionPhase::Initializing,
            Self::Ready(_) => SessionPhase::Ready,
            Self::Disposing(_) => SessionPhase::Disposing,
        }
    }
}

enum Wait {
    Init(watch::Receiver<Option<InitOutcome>>),
    Teardown(watch::Receiver<bool>),
}

// ── Session ──────────────────────────────────────────────────────────

/// One authenticated, connected gateway session.
///
/// Every command is bounded by the configured command timeout. A session
/// never reconnects itself; failures are reported to the caller, which
/// is expected to [`invalidate`](SessionManager::invalidate) it.
pub struct Session {
    generation: u64,
    identity: String,
    established_at: DateTime<Utc>,
    open: AtomicBool,
    transport: Arc<dyn GatewayTransport>,
    command_timeout: Duration,
}

impl Session {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identity name issued by the gateway at pairing.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub async fn send_device_command(
        &self,
        device: DeviceId,
        op: &LightOperation,
    ) -> Result<(), CoreError> {
        self.guarded(
            CommandTarget::Device(device),
            self.transport.send_device_command(device, op),
        )
        .await
    }

    pub async fn send_group_command(
        &self,
        group: GroupId,
        op: &LightOperation,
    ) -> Result<(), CoreError> {
        self.guarded(
            CommandTarget::Group(group),
            self.transport.send_group_command(group, op),
        )
        .await
    }

    pub async fn rename_group(&self, group: GroupId, name: &str) -> Result<(), CoreError> {
        self.guarded(
            CommandTarget::Group(group),
            self.transport.rename_group(group, name),
        )
        .await
    }

    pub async fn rename_device(&self, device: DeviceId, name: &str) -> Result<(), CoreError> {
        self.guarded(
            CommandTarget::Device(device),
            self.transport.rename_device(device, name),
        )
        .await
    }

    async fn guarded<F>(&self, target: CommandTarget, call: F) -> Result<(), CoreError>
    where
        F: Future<Output = Result<(), gateway::Error>>,
    {
        if !self.is_open() {
            return Err(CoreError::CommandFailed {
                target: target.to_string(),
                reason: "session closed".into(),
            });
        }
        match tokio::time::timeout(self.command_timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_connection_lost() => Err(CoreError::ConnectionFailed {
                address: self.transport.address().to_owned(),
                reason: e.to_string(),
            }),
            Ok(Err(e)) => Err(CoreError::CommandFailed {
                target: target.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CoreError::Timeout {
                operation: format!("Command to {target}"),
                timeout_secs: self.command_timeout.as_secs(),
            }),
        }
    }

    /// Close the connection once. Failures are logged, never returned.
    async fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        match tokio::time::timeout(self.command_timeout, self.transport.close()).await {
            Ok(Ok(())) => debug!(generation = self.generation, "gateway connection closed"),
            Ok(Err(e)) => warn!(generation = self.generation, error = %e, "error closing gateway connection"),
            Err(_) => warn!(generation = self.generation, "closing gateway connection timed out"),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("generation", &self.generation)
            .field("identity", &self.identity)
            .field("established_at", &self.established_at)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

// ── SessionManager ───────────────────────────────────────────────────

/// Owns the session lifecycle for one gateway.
///
/// Cheaply cloneable; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: GatewayConfig,
    transport: Arc<dyn GatewayTransport>,
    cache: Arc<DeviceCache>,
    slot: Mutex<Slot>,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn GatewayTransport>,
        cache: Arc<DeviceCache>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                cache,
                slot: Mutex::new(Slot::Uninitialized),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &Arc<DeviceCache> {
        &self.inner.cache
    }

    pub fn state(&self) -> SessionPhase {
        self.inner.lock_slot().phase()
    }

    /// Number of initializations started so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Return the live session, initializing one if needed.
    ///
    /// Concurrent callers share a single initialization. A failed
    /// initialization leaves the manager uninitialized so the next call
    /// starts over.
    pub async fn acquire(&self) -> Result<Arc<Session>, CoreError> {
        loop {
            let wait = {
                let mut slot = self.inner.lock_slot();
                match &*slot {
                    Slot::Ready(session) => return Ok(Arc::clone(session)),
                    Slot::Initializing(rx) => Wait::Init(rx.clone()),
                    Slot::Disposing(rx) => Wait::Teardown(rx.clone()),
                    Slot::Uninitialized => {
                        let (tx, rx) = watch::channel(None);
                        *slot = Slot::Initializing(rx.clone());
                        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
                        tokio::spawn(initialize(Arc::clone(&self.inner), generation, tx));
                        Wait::Init(rx)
                    }
                }
            };
            match wait {
                Wait::Init(rx) => return self.await_init(rx).await,
                Wait::Teardown(rx) => self.inner.await_teardown(rx).await,
            }
        }
    }

    /// Tear down whatever session exists, waiting out a pending
    /// initialization first. Idempotent.
    pub async fn dispose(&self) {
        self.teardown(None).await;
    }

    /// Tear down `session` if it is still the live one. Calls holding a
    /// session from an earlier generation are ignored, so a late failure
    /// never kills its successor.
    pub async fn invalidate(&self, session: &Session) {
        self.teardown(Some(session.generation())).await;
    }

    async fn teardown(&self, only_generation: Option<u64>) {
        loop {
            let wait = {
                let mut slot = self.inner.lock_slot();
                match &*slot {
                    Slot::Uninitialized => return,
                    // The session being invalidated is already gone.
                    Slot::Initializing(_) if only_generation.is_some() => return,
                    Slot::Initializing(rx) => Wait::Init(rx.clone()),
                    Slot::Disposing(rx) => Wait::Teardown(rx.clone()),
                    Slot::Ready(session) => {
                        if let Some(generation) = only_generation {
                            if generation != session.generation() {
                                debug!(
                                    stale = generation,
                                    live = session.generation(),
                                    "ignoring invalidation of stale session"
                                );
                                return;
                            }
                        }
                        let session = Arc::clone(session);
                        let (tx, rx) = watch::channel(false);
                        *slot = Slot::Disposing(rx.clone());
                        tokio::spawn(close_session(Arc::clone(&self.inner), session, tx));
                        Wait::Teardown(rx)
                    }
                }
            };
            match wait {
                Wait::Init(rx) => {
                    // Outcome is irrelevant; loop to dispose whatever it produced.
                    drop(self.await_init(rx).await);
                }
                Wait::Teardown(rx) => {
                    self.inner.await_teardown(rx).await;
                    return;
                }
            }
        }
    }

    async fn await_init(
        &self,
        mut rx: watch::Receiver<Option<InitOutcome>>,
    ) -> Result<Arc<Session>, CoreError> {
        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone());
        let address = || self.inner.transport.address().to_owned();
        match outcome {
            Some(Ok(session)) => Ok(session),
            Some(Err(InitFailure::TimedOut { timeout_secs })) => Err(CoreError::Timeout {
                operation: "Session setup".into(),
                timeout_secs,
            }),
            Some(Err(InitFailure::Failed { reason })) => Err(CoreError::ConnectionFailed {
                address: address(),
                reason,
            }),
            None => {
                self.inner.reset_if(|slot| match slot {
                    Slot::Initializing(current) => current.same_channel(&rx),
                    _ => false,
                });
                Err(CoreError::ConnectionFailed {
                    address: address(),
                    reason: "initialization aborted".into(),
                })
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("address", &self.inner.transport.address())
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl SessionInner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_slot(&self, next: Slot) {
        *self.lock_slot() = next;
    }

    fn reset_if(&self, matches: impl FnOnce(&Slot) -> bool) {
        let mut slot = self.lock_slot();
        if matches(&slot) {
            *slot = Slot::Uninitialized;
        }
    }

    async fn await_teardown(&self, mut rx: watch::Receiver<bool>) {
        if rx.wait_for(|done| *done).await.is_err() {
            self.reset_if(|slot| match slot {
                Slot::Disposing(current) => current.same_channel(&rx),
                _ => false,
            });
        }
    }

    /// Authenticate, connect, observe the full topology, rebuild the cache.
    async fn establish(&self, generation: u64) -> Result<Arc<Session>, gateway::Error> {
        let identity = self
            .transport
            .authenticate(&self.config.security_code)
            .await?;
        debug!(identity = %identity.identity, "gateway issued identity");
        self.transport.connect(&identity).await?;

        let (groups, devices) = try_join(
            observe_all(self.transport.observe_groups()),
            observe_all(self.transport.observe_devices()),
        )
        .await?;

        let device_count = devices.len();
        let groups: Vec<GroupRecord> = groups.into_iter().map(GroupRecord::from).collect();
        let bulbs: Vec<_> = devices.into_iter().filter_map(bulb_from_device).collect();
        debug!(
            groups = groups.len(),
            bulbs = bulbs.len(),
            skipped = device_count - bulbs.len(),
            "topology observed"
        );
        self.cache.rebuild(groups, bulbs);

        Ok(Arc::new(Session {
            generation,
            identity: identity.identity,
            established_at: Utc::now(),
            open: AtomicBool::new(true),
            transport: Arc::clone(&self.transport),
            command_timeout: self.config.command_timeout,
        }))
    }
}

async fn observe_all<T, F>(observe: F) -> Result<Vec<T>, gateway::Error>
where
    F: Future<Output = Result<TopologyStream<T>, gateway::Error>>,
{
    observe.await?.try_collect().await
}

async fn initialize(
    inner: Arc<SessionInner>,
    generation: u64,
    tx: watch::Sender<Option<InitOutcome>>,
) {
    let address = inner.transport.address().to_owned();
    let connect_timeout = inner.config.connect_timeout;
    info!(%address, generation, "opening gateway session");

    let result = match tokio::time::timeout(connect_timeout, inner.establish(generation)).await {
        Ok(Ok(session)) => Ok(session),
        Ok(Err(e)) => Err(InitFailure::Failed {
            reason: e.to_string(),
        }),
        Err(_) => Err(InitFailure::TimedOut {
            timeout_secs: connect_timeout.as_secs(),
        }),
    };

    match &result {
        Ok(session) => {
            info!(
                %address,
                generation,
                identity = %session.identity(),
                groups = inner.cache.group_count(),
                bulbs = inner.cache.bulb_count(),
                "gateway session ready"
            );
            inner.set_slot(Slot::Ready(Arc::clone(session)));
        }
        Err(failure) => {
            warn!(%address, generation, ?failure, "gateway session setup failed");
            match tokio::time::timeout(inner.config.command_timeout, inner.transport.close()).await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "error releasing partial connection"),
                Err(_) => warn!(generation, "releasing partial connection timed out"),
            }
            inner.cache.clear();
            inner.set_slot(Slot::Uninitialized);
        }
    }

    // Waiters may all have given up; nothing to deliver then.
    let _ = tx.send(Some(result));
}

async fn close_session(inner: Arc<SessionInner>, session: Arc<Session>, tx: watch::Sender<bool>) {
    info!(generation = session.generation(), "closing gateway session");
    session.close().await;
    inner.set_slot(Slot::Uninitialized);
    let _ = tx.send(true);
}
