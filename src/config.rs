//! Client configuration: parse/write `clinic.conf`.
//!
//! Same `key = value` format as `theme.conf` and `keybinds.conf`: `#` starts
//! a comment, unknown keys are ignored, missing keys keep their defaults.
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::RoleNaming;
use crate::notify::NotificationDurations;

pub const CONFIG_DIR_NAME: &str = "clinic-tui";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub debounce_ms: u64,
    pub notification_ms: u64,
    pub error_notification_ms: u64,
    pub warning_notification_ms: u64,
    /// Spelling of role names sent to the backend.
    pub role_names: RoleNaming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 15,
            page_size: crate::list::DEFAULT_PAGE_SIZE,
            debounce_ms: 300,
            notification_ms: 5000,
            error_notification_ms: 7000,
            warning_notification_ms: 6000,
            role_names: RoleNaming::English,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notification_durations(&self) -> NotificationDurations {
        NotificationDurations {
            success: Duration::from_millis(self.notification_ms),
            info: Duration::from_millis(self.notification_ms),
            warning: Duration::from_millis(self.warning_notification_ms),
            error: Duration::from_millis(self.error_notification_ms),
        }
    }

    /// Parse `key = value` text over the defaults.
    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for (key, val) in conf_entries(contents) {
            match key {
                "api_base_url" => cfg.api_base_url = val.trim_end_matches('/').to_string(),
                "request_timeout_secs" => set_num(&mut cfg.request_timeout_secs, val),
                "page_size" => {
                    if let Some(n) = val.parse::<usize>().ok().filter(|n| *n > 0) {
                        cfg.page_size = n;
                    }
                }
                "debounce_ms" => set_num(&mut cfg.debounce_ms, val),
                "notification_ms" => set_num(&mut cfg.notification_ms, val),
                "error_notification_ms" => set_num(&mut cfg.error_notification_ms, val),
                "warning_notification_ms" => set_num(&mut cfg.warning_notification_ms, val),
                "role_names" => {
                    if let Some(naming) = RoleNaming::parse(val) {
                        cfg.role_names = naming;
                    }
                }
                _ => {}
            }
        }
        cfg
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# clinic-tui configuration\n");
        buf.push_str("# role_names: english | spanish (spelling of roles sent to the backend)\n\n");
        let _ = writeln!(&mut buf, "api_base_url = {}", self.api_base_url);
        let _ = writeln!(&mut buf, "request_timeout_secs = {}", self.request_timeout_secs);
        let _ = writeln!(&mut buf, "page_size = {}", self.page_size);
        let _ = writeln!(&mut buf, "debounce_ms = {}", self.debounce_ms);
        let _ = writeln!(&mut buf, "notification_ms = {}", self.notification_ms);
        let _ = writeln!(&mut buf, "error_notification_ms = {}", self.error_notification_ms);
        let _ = writeln!(&mut buf, "warning_notification_ms = {}", self.warning_notification_ms);
        let _ = writeln!(&mut buf, "role_names = {}", self.role_names.as_str());
        std::fs::write(path, buf)
    }

    /// Load `path`, else the copy in the user config directory, else write
    /// defaults to `path` and return them.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = config_file_read_path("clinic.conf") {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let cfg = Self::default();
        if let Err(err) = cfg.write_file(path) {
            tracing::warn!(path = %path.display(), %err, "could not write default config");
        }
        cfg
    }
}

/// Non-empty `key = value` pairs of a conf file, trimmed. Comment lines and
/// lines without both sides are skipped.
pub fn conf_entries(contents: &str) -> impl Iterator<Item = (&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
}

fn set_num(slot: &mut u64, val: &str) {
    if let Ok(n) = val.parse::<u64>() {
        *slot = n;
    }
}

/// `<config dir>/clinic-tui/<name>` if that file exists.
pub fn config_file_read_path(name: &str) -> Option<PathBuf> {
    let p = dirs::config_dir()?.join(CONFIG_DIR_NAME).join(name);
    p.exists().then_some(p)
}

/// Default location for files the client writes (session, log).
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_overrides_known_keys_only() {
        let cfg = Config::parse(
            "# comment\napi_base_url = http://clinic:9000/api/\npage_size = 25\nrole_names = spanish\nbogus = 1\ndebounce_ms = nope\n",
        );
        assert_eq!(cfg.api_base_url, "http://clinic:9000/api");
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.role_names, RoleNaming::Spanish);
        assert_eq!(cfg.debounce_ms, 300);
    }

    #[test]
    fn conf_entries_skip_comments_and_halves() {
        let pairs: Vec<_> = conf_entries("# c\n a = 1 \n= 2\nb =\nnoeq\nc = x = y\n").collect();
        assert_eq!(pairs, vec![("a", "1"), ("c", "x = y")]);
    }

    #[test]
    fn zero_page_size_is_ignored() {
        assert_eq!(Config::parse("page_size = 0").page_size, 10);
    }

    #[test]
    fn load_or_init_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.conf");
        let cfg = Config::load_or_init(&path);
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        let reread = Config::from_file(&path).unwrap();
        assert_eq!(reread, cfg);
    }

    #[test]
    fn durations_follow_severity_keys() {
        let cfg = Config::parse("error_notification_ms = 100\nnotification_ms = 50");
        let d = cfg.notification_durations();
        assert_eq!(d.error, Duration::from_millis(100));
        assert_eq!(d.success, Duration::from_millis(50));
        assert_eq!(d.warning, Duration::from_millis(6000));
    }
}
