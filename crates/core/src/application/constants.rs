// Engine constants (fixed targets and command surface, no magic values inline)
use std::time::Duration;

/// Primary ping target (114DNS public resolver); authoritative for overall connectivity
pub const PRIMARY_PING_TARGET: &str = "114.114.114.114";

/// Secondary ping target (Google public DNS); advisory only
pub const SECONDARY_PING_TARGET: &str = "8.8.8.8";

/// Connectivity-check endpoint; any status in [200, 400) counts as reachable
pub const HTTP_PROBE_URL: &str = "http://www.msftconnecttest.com/redirect";

/// Reachable HTTP status band (inclusive lower, exclusive upper)
pub const HTTP_OK_RANGE: std::ops::Range<u16> = 200..400;

/// Number of concurrent probe slots (two pings + one HTTP check)
pub const PROBE_POOL_SLOTS: usize = 3;

/// Extra time granted to the ping process beyond its own reply timeout
pub const PING_PROCESS_GRACE: Duration = Duration::from_secs(3);

/// Observer drain interval (50ms)
pub const DEFAULT_DISPATCH_TICK: Duration = Duration::from_millis(50);

/// `netsh interface show interface`
pub const LIST_ADAPTERS: [&str; 4] = ["netsh", "interface", "show", "interface"];

/// `ipconfig /flushdns`
pub const FLUSH_DNS: [&str; 2] = ["ipconfig", "/flushdns"];

/// `netsh winsock reset`
pub const RESET_WINSOCK: [&str; 3] = ["netsh", "winsock", "reset"];

/// `netsh int ip reset`
pub const RESET_TCPIP: [&str; 4] = ["netsh", "int", "ip", "reset"];

/// `ipconfig /release`
pub const RELEASE_IP: [&str; 2] = ["ipconfig", "/release"];

/// `ipconfig /renew`
pub const RENEW_IP: [&str; 2] = ["ipconfig", "/renew"];
