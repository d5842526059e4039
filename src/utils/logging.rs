//! Structured Logging with Sensitive Data Redaction
//!
//! Log lines go to stderr so stdout stays clean for digests and JSON.
//! Field values are redacted according to their key:
//! - Signer keys, passwords, connection strings: fully
//! - Addresses: first 6 and last 4 hex digits
//! - Hashes and signatures: first 10 and last 6 hex digits
//!
//! Output is `[timestamp] LEVEL [module] message | k=v ...`, or one JSON
//! object per line when JSON output is switched on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static JSON_OUTPUT: AtomicBool = AtomicBool::new(false);

/// Turns debug logging on when set to `1`/`true`/`yes`
pub const DEBUG_ENV_VAR: &str = "MULTISIG_LOG_DEBUG";
/// Switches to JSON lines when set to `json`
pub const FORMAT_ENV_VAR: &str = "MULTISIG_LOG_FORMAT";

pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

pub fn set_json_output(enabled: bool) {
    JSON_OUTPUT.store(enabled, Ordering::SeqCst);
}

/// Apply `MULTISIG_LOG_DEBUG` and `MULTISIG_LOG_FORMAT`
pub fn init_from_env() {
    if let Ok(value) = std::env::var(DEBUG_ENV_VAR) {
        if is_truthy(&value) {
            enable_debug();
        }
    }
    if let Ok(value) = std::env::var(FORMAT_ENV_VAR) {
        set_json_output(value.trim().eq_ignore_ascii_case("json"));
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field value is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    /// Only the length survives
    Full,
    /// `0x9dd1e8...44dd`
    Address,
    /// `0xce3199312f...a2c800`
    Hash,
    None,
}

const SECRET_KEYS: &[&str] = &[
    "private_key",
    "privatekey",
    "secret",
    "password",
    "passphrase",
    "signer_key",
    "signing_key",
    "database_url",
    "mongo",
    "credential",
];
const ADDRESS_KEYS: &[&str] = &["address", "signer", "destination", "contract", "recipient", "wallet"];
const HASH_KEYS: &[&str] = &["hash", "digest", "separator", "signature"];

impl Redaction {
    /// Pick the redaction for a field key; secrets win over addresses and hashes
    pub fn for_key(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        let matches = |list: &[&str]| list.iter().any(|k| key.contains(k));

        if matches(SECRET_KEYS) {
            Redaction::Full
        } else if matches(ADDRESS_KEYS) {
            Redaction::Address
        } else if matches(HASH_KEYS) {
            Redaction::Hash
        } else {
            Redaction::None
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            Redaction::Full => redact_value(value),
            Redaction::Address => redact_address(value),
            Redaction::Hash => redact_hash(value),
            Redaction::None => value.to_string(),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(self, key: &'static str, value: impl fmt::Display) -> Self {
        self.with_redaction(key, value, Redaction::for_key(key))
    }

    /// Add a field with an explicit redaction
    pub fn with_redaction(
        mut self,
        key: &'static str,
        value: impl fmt::Display,
        redaction: Redaction,
    ) -> Self {
        self.fields.push((key, redaction.apply(&value.to_string())));
        self
    }

    /// Text form without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push_str(if i == 0 { " | " } else { " " });
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    /// JSON form; `timestamp` is passed in so output is testable
    pub fn render_json(&self, timestamp: &str) -> String {
        let mut object = serde_json::Map::new();
        object.insert("timestamp".into(), timestamp.into());
        object.insert("level".into(), self.level.as_str().into());
        object.insert("module".into(), self.module.into());
        object.insert("message".into(), self.message.clone().into());
        for (key, value) in &self.fields {
            object.insert((*key).to_string(), value.clone().into());
        }
        serde_json::Value::Object(object).to_string()
    }

    /// Write the entry to stderr; debug entries are dropped unless enabled
    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        if JSON_OUTPUT.load(Ordering::SeqCst) {
            eprintln!("{}", self.render_json(&timestamp));
        } else {
            eprintln!("[{}] {}", timestamp, self.render());
        }
    }
}

fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Keep a prefix and suffix of a hex string, counting the `0x` as prefix
fn keep_ends(value: &str, prefix: usize, suffix: usize) -> Option<String> {
    let value = value.trim();
    let prefix = if value.starts_with("0x") { prefix + 2 } else { prefix };
    if !value.is_ascii() || value.len() <= prefix + suffix + 3 {
        return None;
    }
    Some(format!("{}...{}", &value[..prefix], &value[value.len() - suffix..]))
}

fn redact_address(address: &str) -> String {
    if address.trim().is_empty() {
        return "[EMPTY]".to_string();
    }
    keep_ends(address, 6, 4).unwrap_or_else(|| redact_value(address.trim()))
}

fn redact_hash(hash: &str) -> String {
    if hash.trim().is_empty() {
        return "[EMPTY]".to_string();
    }
    keep_ends(hash, 10, 6).unwrap_or_else(|| hash.trim().to_string())
}

/// Build and emit a [`LogEntry`] at the given level
#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// `log_debug!("module", "message", key = value, ...)`
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::log_at!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::log_at!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::log_at!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::log_at!(Error, $($args)*) };
}
