// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;
pub const WS_PATH: &str = "ws";

// Namespace configuration constants
pub const DEFAULT_NAMESPACE: &str = "/";

// Capacity of the adapter lifecycle event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
