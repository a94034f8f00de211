//! Environment variable handling.

use std::env;

/// Environment variable overriding the Sealkeep base directory.
pub const HOME_VAR: &str = "SEALKEEP_HOME";

/// Environment variable toggling the macOS Keychain backend.
pub const KEYCHAIN_VAR: &str = "SEALKEEP_KEYCHAIN";

/// Environment variable toggling the Windows Credential Manager backend.
pub const CREDENTIAL_MANAGER_VAR: &str = "SEALKEEP_CREDENTIAL_MANAGER";

/// Environment variable capping the usable AES key length.
pub const MAX_KEY_BITS_VAR: &str = "SEALKEEP_MAX_KEY_BITS";

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean, `None` if unset.
pub fn get_opt_bool(name: &str) -> Option<bool> {
    get_var(name).map(|v| parse_bool(&v))
}

/// Get an environment variable as a u32.
pub fn get_u32(name: &str) -> Option<u32> {
    get_var(name).and_then(|v| v.trim().parse().ok())
}

/// Name of the current OS user, used to scope vault credentials.
pub fn current_user() -> String {
    get_var("USER")
        .or_else(|| get_var("USERNAME"))
        .unwrap_or_else(|| "anonymous".to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
