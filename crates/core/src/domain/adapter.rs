// Network adapter names and the interface-table parser

use serde::{Deserialize, Serialize};

/// Characters that must never reach a command line inside an adapter name
pub const BLOCKED_NAME_CHARS: [char; 11] = ['"', '\'', '`', '|', '&', ';', '(', ')', '$', '\r', '\n'];

/// Header markers of `netsh interface show interface` (English and Chinese locales)
pub const INTERFACE_HEADER_MARKERS: [&str; 2] = ["Admin", "管理员"];

/// Adapter names start at this whitespace-separated column
const NAME_COLUMN: usize = 3;

/// Network adapter name.
///
/// Validity is not an invariant of the type: names come from parsed command
/// output or from the operator, and are checked with [`validate_adapter_name`]
/// right before they are interpolated into a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterName(String);

impl AdapterName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AdapterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdapterName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reject empty names and names containing shell metacharacters or line breaks
pub fn validate_adapter_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| BLOCKED_NAME_CHARS.contains(&c))
}

/// Parse the table printed by `netsh interface show interface`.
///
/// ```text
/// Admin State    State          Type             Interface Name
/// -------------------------------------------------------------------------
/// Enabled        Connected      Dedicated        Wi-Fi
/// Disabled       Disconnected   Dedicated        Ethernet 2
/// ```
///
/// Names may contain spaces, so every token from the fourth column on is
/// re-joined with a single space.
pub fn parse_interface_table(output: &str) -> Vec<AdapterName> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('-'))
        .filter(|line| !INTERFACE_HEADER_MARKERS.iter().any(|m| line.contains(m)))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() > NAME_COLUMN {
                Some(AdapterName::new(tokens[NAME_COLUMN..].join(" ")))
            } else {
                None
            }
        })
        .collect()
}

/// Adapter list snapshot with the time it was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAdapterList {
    pub names: Vec<AdapterName>,
    pub populated_at_ms: i64,
}

impl CachedAdapterList {
    pub fn new(names: Vec<AdapterName>, populated_at_ms: i64) -> Self {
        Self {
            names,
            populated_at_ms,
        }
    }

    /// Age below TTL means fresh; a clock that went backwards counts as fresh
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.populated_at_ms < ttl_ms
    }
}
