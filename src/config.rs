//! Configuration file handling.
//!
//! Settings come from `.sql_bridge.json` in the current directory, with
//! `SQL_BRIDGE_*` environment variables as a fallback for credentials.
//! Command-line arguments override both.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::db::Credentials;
use crate::logging::LogFormat;

pub const CONFIG_FILE: &str = ".sql_bridge.json";

pub const ENV_DSN: &str = "SQL_BRIDGE_DSN";
pub const ENV_USER: &str = "SQL_BRIDGE_USER";
pub const ENV_PASSWORD: &str = "SQL_BRIDGE_PASSWORD";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub credentials: Credentials,
    pub max_rows: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl ConfigFile {
    /// Load `.sql_bridge.json` from the current directory.
    ///
    /// A missing file is not an error and yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not valid JSON.
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Self::load_from(&PathBuf::from(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;

        Ok(config)
    }
}

/// Everything `main` needs to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub credentials: Credentials,
    pub max_rows: Option<usize>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Merge arguments, file and environment, in that order of priority.
    ///
    /// Each credential field is taken from the first source that supplies a
    /// non-empty value.
    pub fn resolve(args: &Args, file: ConfigFile) -> Self {
        Self::resolve_with_env(args, file, |name| std::env::var(name).ok())
    }

    pub fn resolve_with_env(
        args: &Args,
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let from_args = Credentials::from_args(args.credentials.as_slice());
        let pick = |arg: &str, file: &str, var: &str| -> String {
            [Some(arg.to_string()), Some(file.to_string()), env(var)]
                .into_iter()
                .flatten()
                .find(|v| !v.is_empty())
                .unwrap_or_default()
        };
        let credentials = Credentials::new(
            pick(
                &from_args.datasource_name,
                &file.credentials.datasource_name,
                ENV_DSN,
            ),
            pick(&from_args.username, &file.credentials.username, ENV_USER),
            pick(&from_args.password, &file.credentials.password, ENV_PASSWORD),
        );

        Self {
            credentials,
            max_rows: args.max_rows.or(file.max_rows),
            log_level: args
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "warn".to_string()),
            log_format: file.log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["sql_bridge"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[rstest]
    fn test_full_deserialization() {
        let json = r#"
        {
            "credentials": {
                "datasource_name": "testdb",
                "username": "sa",
                "password": "secret"
            },
            "max_rows": 100,
            "log_level": "debug",
            "log_format": "json"
        }
        "#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.credentials, Credentials::new("testdb", "sa", "secret"));
        assert_eq!(config.max_rows, Some(100));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    fn test_partial_deserialization_uses_defaults() {
        let json = r#"{ "credentials": { "datasource_name": "testdb" } }"#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.credentials.datasource_name, "testdb");
        assert_eq!(config.credentials.username, "");
        assert!(config.max_rows.is_none());
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[rstest]
    fn test_load_missing_file_gives_defaults() {
        let _lock = test_lock().lock();
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.credentials, Credentials::default());
    }

    #[rstest]
    fn test_load_invalid_json() {
        let _lock = test_lock().lock();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ invalid json }").unwrap();

        let result = ConfigFile::load_from(&path);
        assert!(result.unwrap_err().to_string().contains("Invalid JSON"));
    }

    #[rstest]
    fn test_load_from_current_directory() {
        let _lock = test_lock().lock();
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE),
            r#"{ "credentials": { "datasource_name": "fromfile" } }"#,
        )
        .unwrap();

        let old_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();
        let config = ConfigFile::load();
        std::env::set_current_dir(old_dir).unwrap();

        assert_eq!(config.unwrap().credentials.datasource_name, "fromfile");
    }

    #[rstest]
    fn test_args_override_file_and_env() {
        let file = ConfigFile {
            credentials: Credentials::new("filedb", "fileuser", "filepw"),
            ..ConfigFile::default()
        };
        let env = env_of(&[(ENV_DSN, "envdb"), (ENV_USER, "envuser")]);
        let settings = Settings::resolve_with_env(&args(&["argdb"]), file, env);
        assert_eq!(
            settings.credentials,
            Credentials::new("argdb", "fileuser", "filepw")
        );
    }

    #[rstest]
    fn test_env_fills_gaps() {
        let env = env_of(&[
            (ENV_DSN, "envdb"),
            (ENV_USER, "envuser"),
            (ENV_PASSWORD, "envpw"),
        ]);
        let settings = Settings::resolve_with_env(&args(&[]), ConfigFile::default(), env);
        assert_eq!(
            settings.credentials,
            Credentials::new("envdb", "envuser", "envpw")
        );
    }

    #[rstest]
    #[case(&[], None, None)]
    #[case(&["--max-rows", "5"], Some(100), Some(5))]
    #[case(&[], Some(100), Some(100))]
    fn test_max_rows_priority(
        #[case] argv: &[&str],
        #[case] from_file: Option<usize>,
        #[case] expected: Option<usize>,
    ) {
        let file = ConfigFile {
            max_rows: from_file,
            ..ConfigFile::default()
        };
        let settings = Settings::resolve_with_env(&args(argv), file, env_of(&[]));
        assert_eq!(settings.max_rows, expected);
    }

    #[rstest]
    fn test_log_level_default_and_override() {
        let settings = Settings::resolve_with_env(&args(&[]), ConfigFile::default(), env_of(&[]));
        assert_eq!(settings.log_level, "warn");

        let file = ConfigFile {
            log_level: Some("info".to_string()),
            ..ConfigFile::default()
        };
        let settings = Settings::resolve_with_env(&args(&["--log-level", "debug"]), file, env_of(&[]));
        assert_eq!(settings.log_level, "debug");
    }
}
