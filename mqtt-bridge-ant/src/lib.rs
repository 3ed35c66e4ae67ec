//! MQTT bridge for ANT+ bike sensor broadcasts.
//!
//! The bridge opens one receive channel per configured sensor (heart rate,
//! cadence, speed, power), wraps each raw 8-byte broadcast in the JSON wire
//! format from `antbridge-common` and publishes it to an MQTT broker. A
//! control topic accepts a `{"command": "restart"}` message that tears down
//! and rebuilds the full channel set.
//!
//! The radio protocol itself lives behind [`driver::AntDriver`]. The shipped
//! binary runs against [`driver::SimDriver`]; hardware radios integrate by
//! implementing the trait and calling [`runtime::run`].

pub mod args;
pub mod channel;
pub mod config;
pub mod control;
pub mod driver;
pub mod publisher;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod status;

pub use args::BridgeArgs;
pub use config::{AntBridgeConfig, OpenPolicy, SensorSpec};
pub use driver::{AntDriver, ChannelError, DriverChannel, FrameSink, SimDriver};
pub use publisher::{MessageSink, MqttSink, PublishError};
pub use registry::{ChannelRegistry, OpenReport};
pub use runtime::{Bridge, BridgeError, BridgeState};
