// ── In-memory gateway ──
//
// A `GatewayTransport` backed by plain data instead of a network link.
// Counts every call, records issued commands, and can be told to fail
// at specific points. Used by `valo --simulate` and by the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;
use crate::transport::{GatewayTransport, TopologyStream};
use crate::types::{
    CommandTarget, DeviceId, DeviceInfo, GroupId, GroupInfo, Identity, LightOperation,
    LightReading,
};

/// Name the gateway gives its built-in all-devices group.
pub const SUPER_GROUP_NAME: &str = "SuperGroup";

/// Call sites where a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Authenticate,
    Connect,
    /// Fails device observation after the first device has been yielded.
    Topology,
    DeviceCommand,
    GroupCommand,
    Rename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Once,
    Always,
}

/// A command accepted by the simulator, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCommand {
    pub target: CommandTarget,
    pub operation: LightOperation,
}

#[derive(Debug, Default)]
struct SimState {
    groups: Vec<GroupInfo>,
    devices: Vec<DeviceInfo>,
    connected: bool,
    issued: Vec<IssuedCommand>,
    failures: HashMap<FailurePoint, Failure>,
}

#[derive(Debug, Default)]
struct Counters {
    authenticate: AtomicUsize,
    connect: AtomicUsize,
    close: AtomicUsize,
    device_commands: AtomicUsize,
    group_commands: AtomicUsize,
    renames: AtomicUsize,
}

/// In-memory gateway with call counting and failure injection.
#[derive(Debug)]
pub struct SimulatedGateway {
    address: String,
    security_code: Option<String>,
    latency: Duration,
    state: Mutex<SimState>,
    counters: Counters,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl SimulatedGateway {
    /// Create a simulator with the given topology. Any security code is accepted.
    pub fn new(groups: Vec<GroupInfo>, devices: Vec<DeviceInfo>) -> Self {
        Self {
            address: "simulated".into(),
            security_code: None,
            latency: Duration::ZERO,
            state: Mutex::new(SimState {
                groups,
                devices,
                ..SimState::default()
            }),
            counters: Counters::default(),
        }
    }

    /// A small household: two rooms, an empty hallway, a remote, and the super group.
    pub fn with_demo_topology() -> Self {
        let bulb = |id: DeviceId, name: &str, color: &str, dimmer: u8, on: bool| DeviceInfo {
            id,
            name: name.into(),
            alive: true,
            last_seen: 1_700_000_000,
            light: Some(LightReading {
                color: color.into(),
                dimmer,
                on,
            }),
        };
        let devices = vec![
            DeviceInfo {
                id: 65536,
                name: "Remote".into(),
                alive: true,
                last_seen: 1_700_000_000,
                light: None,
            },
            bulb(65537, "Sofa Lamp", "f1e0b5", 80, true),
            bulb(65538, "Ceiling", "ffffff", 100, false),
            bulb(65539, "Counter", "efd275", 45, true),
        ];
        let groups = vec![
            GroupInfo {
                id: 131_073,
                name: SUPER_GROUP_NAME.into(),
                device_ids: vec![65536, 65537, 65538, 65539],
            },
            GroupInfo {
                id: 131_074,
                name: "Living Room".into(),
                device_ids: vec![65537, 65538],
            },
            GroupInfo {
                id: 131_075,
                name: "Kitchen".into(),
                device_ids: vec![65539],
            },
            GroupInfo {
                id: 131_076,
                name: "Hallway".into(),
                device_ids: Vec::new(),
            },
        ];
        Self::new(groups, devices)
    }

    /// Require this security code during authentication.
    pub fn with_security_code(mut self, code: impl Into<String>) -> Self {
        self.security_code = Some(code.into());
        self
    }

    /// Delay every transport call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Override the reported address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    // ── Failure injection ───────────────────────────────────────────

    /// Fail the next call at `point`, then recover.
    pub fn fail_once(&self, point: FailurePoint) {
        self.lock().failures.insert(point, Failure::Once);
    }

    /// Fail every call at `point` until [`recover`](Self::recover) is called.
    pub fn fail_always(&self, point: FailurePoint) {
        self.lock().failures.insert(point, Failure::Always);
    }

    /// Clear any injected failure at `point`.
    pub fn recover(&self, point: FailurePoint) {
        self.lock().failures.remove(&point);
    }

    // ── Observation ─────────────────────────────────────────────────

    pub fn authenticate_calls(&self) -> usize {
        self.counters.authenticate.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.counters.connect.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.counters.close.load(Ordering::SeqCst)
    }

    pub fn device_command_calls(&self) -> usize {
        self.counters.device_commands.load(Ordering::SeqCst)
    }

    pub fn group_command_calls(&self) -> usize {
        self.counters.group_commands.load(Ordering::SeqCst)
    }

    pub fn rename_calls(&self) -> usize {
        self.counters.renames.load(Ordering::SeqCst)
    }

    /// Total number of calls that would have reached the gateway as commands.
    pub fn command_calls(&self) -> usize {
        self.device_command_calls() + self.group_command_calls() + self.rename_calls()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Commands accepted so far, oldest first.
    pub fn issued_commands(&self) -> Vec<IssuedCommand> {
        self.lock().issued.clone()
    }

    /// Current simulated state of a device.
    pub fn device(&self, id: DeviceId) -> Option<DeviceInfo> {
        self.lock().devices.iter().find(|d| d.id == id).cloned()
    }

    /// Current simulated state of a group.
    pub fn group(&self, id: GroupId) -> Option<GroupInfo> {
        self.lock().groups.iter().find(|g| g.id == id).cloned()
    }

    /// Replace a device's reported light reading (e.g. to feed malformed data).
    pub fn set_light_reading(&self, id: DeviceId, reading: LightReading) {
        if let Some(device) = self.lock().devices.iter_mut().find(|d| d.id == id) {
            device.light = Some(reading);
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Consume an injected failure at `point`, if any.
    fn should_fail(state: &mut SimState, point: FailurePoint) -> bool {
        match state.failures.get(&point).copied() {
            Some(Failure::Once) => {
                state.failures.remove(&point);
                true
            }
            Some(Failure::Always) => true,
            None => false,
        }
    }

    fn require_connected(state: &SimState) -> Result<(), Error> {
        if state.connected {
            Ok(())
        } else {
            Err(Error::Closed)
        }
    }
}

fn apply_to_reading(reading: &mut LightReading, op: &LightOperation) {
    reading.on = op.on;
    if let Some(color) = &op.color {
        reading.color.clone_from(color);
    }
    if let Some(dimmer) = op.dimmer {
        reading.dimmer = dimmer;
    }
}

#[async_trait]
impl GatewayTransport for SimulatedGateway {
    fn address(&self) -> &str {
        &self.address
    }

    async fn authenticate(&self, security_code: &SecretString) -> Result<Identity, Error> {
        let call = self.counters.authenticate.fetch_add(1, Ordering::SeqCst) + 1;
        self.pause().await;

        let mut state = self.lock();
        if Self::should_fail(&mut state, FailurePoint::Authenticate) {
            return Err(Error::Authentication {
                message: "injected failure".into(),
            });
        }
        if let Some(expected) = &self.security_code {
            if security_code.expose_secret() != expected {
                return Err(Error::Authentication {
                    message: "security code rejected".into(),
                });
            }
        }
        debug!(call, "simulated gateway issued identity");
        Ok(Identity {
            identity: format!("valo-sim-{call}"),
            psk: SecretString::from(format!("psk-{call}")),
        })
    }

    async fn connect(&self, identity: &Identity) -> Result<(), Error> {
        self.counters.connect.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.lock();
        if Self::should_fail(&mut state, FailurePoint::Connect) {
            return Err(Error::Connect {
                address: self.address.clone(),
                reason: "injected failure".into(),
            });
        }
        state.connected = true;
        debug!(identity = %identity.identity, "simulated gateway connected");
        Ok(())
    }

    async fn observe_groups(&self) -> Result<TopologyStream<GroupInfo>, Error> {
        self.pause().await;
        let groups = {
            let state = self.lock();
            Self::require_connected(&state)?;
            state.groups.clone()
        };
        Ok(futures_util::stream::iter(groups.into_iter().map(Ok)).boxed())
    }

    async fn observe_devices(&self) -> Result<TopologyStream<DeviceInfo>, Error> {
        self.pause().await;
        let (devices, fail) = {
            let mut state = self.lock();
            Self::require_connected(&state)?;
            let fail = Self::should_fail(&mut state, FailurePoint::Topology);
            (state.devices.clone(), fail)
        };
        let stream = async_stream::stream! {
            for (index, device) in devices.into_iter().enumerate() {
                if fail && index == 1 {
                    yield Err(Error::Topology { message: "injected failure".into() });
                    return;
                }
                yield Ok(device);
            }
        };
        Ok(stream.boxed())
    }

    async fn send_group_command(&self, group: GroupId, op: &LightOperation) -> Result<(), Error> {
        self.counters.group_commands.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.lock();
        Self::require_connected(&state)?;
        if Self::should_fail(&mut state, FailurePoint::GroupCommand) {
            return Err(Error::CommandRejected {
                message: "injected failure".into(),
            });
        }
        let members = state
            .groups
            .iter()
            .find(|g| g.id == group)
            .map(|g| g.device_ids.clone())
            .ok_or_else(|| Error::CommandRejected {
                message: format!("unknown group {group}"),
            })?;
        for device in state.devices.iter_mut().filter(|d| members.contains(&d.id)) {
            if let Some(reading) = device.light.as_mut() {
                apply_to_reading(reading, op);
            }
        }
        state.issued.push(IssuedCommand {
            target: CommandTarget::Group(group),
            operation: op.clone(),
        });
        Ok(())
    }

    async fn send_device_command(
        &self,
        device: DeviceId,
        op: &LightOperation,
    ) -> Result<(), Error> {
        self.counters.device_commands.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.lock();
        Self::require_connected(&state)?;
        if Self::should_fail(&mut state, FailurePoint::DeviceCommand) {
            return Err(Error::CommandRejected {
                message: "injected failure".into(),
            });
        }
        let reading = state
            .devices
            .iter_mut()
            .find(|d| d.id == device)
            .and_then(|d| d.light.as_mut())
            .ok_or_else(|| Error::CommandRejected {
                message: format!("device {device} is not a light"),
            })?;
        apply_to_reading(reading, op);
        state.issued.push(IssuedCommand {
            target: CommandTarget::Device(device),
            operation: op.clone(),
        });
        Ok(())
    }

    async fn rename_group(&self, group: GroupId, name: &str) -> Result<(), Error> {
        self.counters.renames.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.lock();
        Self::require_connected(&state)?;
        if Self::should_fail(&mut state, FailurePoint::Rename) {
            return Err(Error::CommandRejected {
                message: "injected failure".into(),
            });
        }
        let entry = state
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or_else(|| Error::CommandRejected {
                message: format!("unknown group {group}"),
            })?;
        entry.name = name.to_owned();
        Ok(())
    }

    async fn rename_device(&self, device: DeviceId, name: &str) -> Result<(), Error> {
        self.counters.renames.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.lock();
        Self::require_connected(&state)?;
        if Self::should_fail(&mut state, FailurePoint::Rename) {
            return Err(Error::CommandRejected {
                message: "injected failure".into(),
            });
        }
        let entry = state
            .devices
            .iter_mut()
            .find(|d| d.id == device)
            .ok_or_else(|| Error::CommandRejected {
                message: format!("unknown device {device}"),
            })?;
        entry.name = name.to_owned();
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.counters.close.fetch_add(1, Ordering::SeqCst);
        self.lock().connected = false;
        debug!("simulated gateway closed");
        Ok(())
    }
}
