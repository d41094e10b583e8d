//! Environment variable names and default file locations.

use std::env;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Environment variable providing the CloudGuard API key.
pub const ENV_CLOUDGUARD_API_KEY: &str = "CLOUDGUARD_API_KEY";
/// Environment variable providing the CloudGuard API secret.
pub const ENV_CLOUDGUARD_API_SECRET: &str = "CLOUDGUARD_API_SECRET";
/// Environment variable overriding the configuration file path.
pub const ENV_CLOUDGUARD_CONFIG: &str = "CLOUDGUARD_CONFIG";
/// Environment variable overriding the credentials file path.
pub const ENV_CLOUDGUARD_CREDENTIALS: &str = "CLOUDGUARD_CREDENTIALS";
/// Environment variable selecting the CloudGuard region.
pub const ENV_CLOUDGUARD_REGION: &str = "CLOUDGUARD_REGION";

/// Base directory for user configuration, on every platform.
pub const ENV_XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";

/// Name of the directory holding CloudGuard's configuration.
pub const CONFIG_DIR_NAME: &str = "cloudguard";

const CONFIG_FILE_NAME: &str = "config";
const CREDENTIALS_FILE_NAME: &str = "credentials";

/// XDG configuration home: an absolute `$XDG_CONFIG_HOME`, else
/// `~/.config`.
///
/// Applies on every platform, macOS and Windows included.
pub fn xdg_config_home() -> Option<PathBuf> {
    env::var_os(ENV_XDG_CONFIG_HOME)
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")))
}

/// Per-user CloudGuard configuration directory
/// (`$XDG_CONFIG_HOME/cloudguard`).
///
/// Returns `None` when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    xdg_config_home().map(|dir| dir.join(CONFIG_DIR_NAME))
}

/// Default location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Default location of the credentials file, next to the configuration file.
pub fn default_credentials_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CREDENTIALS_FILE_NAME))
}

/// Expand a leading `~` component to the user's home directory.
///
/// `~user` forms are left untouched.
pub fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match BaseDirs::new() {
        Some(dirs) if rest.as_os_str().is_empty() => dirs.home_dir().to_path_buf(),
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Read an environment variable as a string.
///
/// A value that is not valid Unicode is reported and treated as unset.
pub(crate) fn var(name: &str) -> Option<String> {
    let value = env::var_os(name)?;
    match value.into_string() {
        Ok(value) => Some(value),
        Err(raw) => {
            tracing::warn!(
                variable = name,
                value = ?raw,
                "ignoring non-Unicode environment variable"
            );
            None
        }
    }
}

/// Pick the effective path: explicit argument, then a non-empty environment
/// override, then the default.
pub(crate) fn resolve(
    explicit: Option<&Path>,
    env_var: &str,
    default: fn() -> Option<PathBuf>,
) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            env::var_os(env_var)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .or_else(default)
}
