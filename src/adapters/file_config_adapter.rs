//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[sqlite]
path = journal.db
pool_size = 8

[web]
listen = 127.0.0.1:3000

[auth]
username = trader
session_lifetime = 86400

[journal]
default_range_days = 90
export_on_shutdown = yes
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("journal.db".to_string())
        );
        assert_eq!(
            adapter.get_string("auth", "username"),
            Some("trader".to_string())
        );
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("127.0.0.1:3000".to_string())
        );
    }

    #[test]
    fn missing_keys_return_none_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("auth", "password_hash"), None);
        assert_eq!(adapter.get_string("nope", "key"), None);
        assert_eq!(adapter.get_int("journal", "missing", 42), 42);
        assert_eq!(adapter.get_double("journal", "missing", 9.5), 9.5);
    }

    #[test]
    fn ints_and_doubles_parse() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 8);
        assert_eq!(adapter.get_int("journal", "default_range_days", 30), 90);
        assert_eq!(adapter.get_double("sqlite", "pool_size", 0.0), 8.0);
    }

    #[test]
    fn non_numeric_falls_back_to_default() {
        let adapter = FileConfigAdapter::from_string("[sqlite]\npool_size = lots\n").unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 4);
        assert_eq!(adapter.get_double("sqlite", "pool_size", 4.0), 4.0);
    }

    #[test]
    fn bools_accept_yes_no_forms() {
        let adapter = FileConfigAdapter::from_string(
            "[journal]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("journal", "a", false));
        assert!(adapter.get_bool("journal", "b", false));
        assert!(adapter.get_bool("journal", "c", false));
        assert!(!adapter.get_bool("journal", "d", true));
        assert!(!adapter.get_bool("journal", "e", true));
        assert!(!adapter.get_bool("journal", "f", true));
        assert!(adapter.get_bool("journal", "missing", true));
    }

    #[test]
    fn from_file_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("journal", "default_range_days", 0), 90);
        assert!(adapter.get_bool("journal", "export_on_shutdown", false));
    }

    #[test]
    fn from_file_missing_path_errors() {
        assert!(FileConfigAdapter::from_file("/nonexistent/verotrade.ini").is_err());
    }
}
