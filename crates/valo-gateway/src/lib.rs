//! Transport boundary between `valo-core` and a smart-lighting gateway.
//!
//! The wire protocol itself belongs to a device-communication library;
//! this crate only fixes the shape of what the session layer needs:
//!
//! - **[`GatewayTransport`]**: async, fallible calls for pairing,
//!   connecting, topology observation, commands, and teardown.
//! - **Wire types** ([`types`]): groups, devices, raw light readings,
//!   and [`LightOperation`] commands in the gateway's native units.
//! - **[`SimulatedGateway`]**: in-memory implementation with call
//!   counters and failure injection, for demos and tests.

pub mod error;
pub mod simulator;
pub mod transport;
pub mod types;

pub use error::Error;
pub use simulator::{FailurePoint, IssuedCommand, SUPER_GROUP_NAME, SimulatedGateway};
pub use transport::{GatewayTransport, TopologyStream};
pub use types::{
    CommandTarget, DeviceId, DeviceInfo, GroupId, GroupInfo, Identity, LightOperation,
    LightReading,
};
