pub const TOPIC_MONITOR_STATE: &str = "roomsense/monitor/state";

pub const TOPIC_CMD_PRESENCE: &str = "roomsense/cmnd/presence/toggle";
pub const TOPIC_CMD_LED: &str = "roomsense/cmnd/led/toggle";
pub const TOPIC_CMD_MODE: &str = "roomsense/cmnd/mode/toggle";
