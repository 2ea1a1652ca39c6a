// ── Transport boundary ──
//
// The device-communication layer a session is built on. Implementations
// own the wire protocol; callers only see these fallible async calls.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use secrecy::SecretString;

use crate::error::Error;
use crate::types::{DeviceId, DeviceInfo, GroupId, GroupInfo, Identity, LightOperation};

/// Stream of topology entries produced by an observation call.
///
/// The stream ends once the gateway has reported its full topology.
/// An `Err` item aborts the observation.
pub type TopologyStream<T> = BoxStream<'static, Result<T, Error>>;

/// A connection-capable handle to one gateway.
///
/// A transport is bound to a gateway address at construction and can be
/// connected, closed, and connected again. At most one connection is
/// live at a time; callers are responsible for not interleaving
/// `connect` and `close`.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// Address this transport talks to (for diagnostics).
    fn address(&self) -> &str;

    /// Exchange the pairing security code for a session identity.
    async fn authenticate(&self, security_code: &SecretString) -> Result<Identity, Error>;

    /// Open the secured connection using a previously issued identity.
    async fn connect(&self, identity: &Identity) -> Result<(), Error>;

    /// Observe every group the gateway knows about.
    async fn observe_groups(&self) -> Result<TopologyStream<GroupInfo>, Error>;

    /// Observe every device the gateway knows about.
    async fn observe_devices(&self) -> Result<TopologyStream<DeviceInfo>, Error>;

    /// Apply a light operation to every member of a group at once.
    async fn send_group_command(&self, group: GroupId, op: &LightOperation) -> Result<(), Error>;

    /// Apply a light operation to a single device.
    async fn send_device_command(&self, device: DeviceId, op: &LightOperation)
    -> Result<(), Error>;

    async fn rename_group(&self, group: GroupId, name: &str) -> Result<(), Error>;

    async fn rename_device(&self, device: DeviceId, name: &str) -> Result<(), Error>;

    /// Tear down the connection. Safe to call when not connected.
    async fn close(&self) -> Result<(), Error>;
}
