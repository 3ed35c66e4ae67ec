//! MQTT topic names used by the bridge.

/// Topic raw sensor frames are published to.
pub const DATA_TOPIC: &str = "org.teamtibco.bikesensor.rawdata";

/// Topic the bridge subscribes to for control commands.
pub const CONTROL_TOPIC: &str = "org.teamtibco.antdevice.control";

/// Topic bridge status messages are published to.
pub const STATUS_TOPIC: &str = "org.teamtibco.antdevice.status";
