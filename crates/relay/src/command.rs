//! Subprocess helpers shared by the tool collaborators.

use std::ffi::OsStr;
use std::process::Stdio;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Create a `std::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
///
/// On non-Windows targets the flag is a no-op.
pub fn std_command(program: impl AsRef<OsStr>) -> std::process::Command {
    #[allow(unused_mut)]
    let mut cmd = std::process::Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    #[allow(unused_mut)]
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.as_std_mut().creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Probe a binary by running `<program> --version` (or a custom flag) and
/// return the first output line when the probe succeeds.
pub fn probe_version(program: &str, flag: &str) -> Option<String> {
    let mut cmd = std_command(program);
    cmd.arg(flag).stderr(Stdio::null());
    cmd.output().ok().filter(|o| o.status.success()).and_then(|o| {
        String::from_utf8(o.stdout)
            .ok()
            .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn probe_version_missing_binary_is_none() {
        assert!(probe_version("definitely-not-a-real-binary", "--version").is_none());
    }
}
