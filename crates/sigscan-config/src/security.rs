use std::fs;
use std::path::Path;

/// Set restrictive permissions on config file (Unix only)
#[cfg(unix)]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600); // rw------- (user read/write only)
    fs::set_permissions(path, perms)
}

/// Set config permissions (no-op outside Unix)
#[cfg(not(unix))]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    fs::metadata(path).map(|_| ())
}
