// SPDX-License-Identifier: GPL-2.0-only

//! Startup-program execution (spec.md §6 "CLI"): `-s <startup-cmd>` on the
//! command line takes precedence, then `$XDG_CONFIG_HOME/labwc/autostart`,
//! then `$HOME/.config/labwc/autostart`.

use std::{
    env, fs,
    path::PathBuf,
    process::{Command, Stdio},
};
use tracing::{error, info, warn};

/// Run the startup program: `cli_startup_cmd` (the `-s` flag) if given,
/// else the autostart file found via XDG search.
pub fn run_startup_program(cli_startup_cmd: Option<&str>) {
    if let Some(cmd) = cli_startup_cmd {
        info!("running startup command from -s: {}", cmd);
        execute_program(cmd);
        return;
    }

    if let Some(path) = find_config_program() {
        info!(path = %path.display(), "running startup program");
        execute_program(path.to_string_lossy().as_ref());
    } else {
        info!("no startup program configured, skipping");
    }
}

fn find_config_program() -> Option<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("labwc/autostart");
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(home) = env::var("HOME") {
        let path = PathBuf::from(home).join(".config/labwc/autostart");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

fn execute_program(program_path: &str) {
    let path = PathBuf::from(program_path);
    if path.exists() && !is_executable(&path) {
        warn!("startup program {} exists but is not executable", program_path);
        return;
    }

    match Command::new(program_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => match child.try_wait() {
            Ok(Some(status)) if !status.success() => {
                warn!("startup program exited with status: {}", status);
            }
            Ok(_) => info!("startup program launched"),
            Err(err) => error!("failed to check startup program status: {}", err),
        },
        Err(err) => error!("failed to execute startup program: {}", err),
    }
}

#[cfg(unix)]
fn is_executable(path: &PathBuf) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(_path: &PathBuf) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_config_program_prefers_xdg_config_home_over_home() {
        let dir = env::temp_dir().join(format!(
            "labwc-core-startup-test-{:?}",
            std::thread::current().id()
        ));
        let xdg_autostart_dir = dir.join("xdg/labwc");
        fs::create_dir_all(&xdg_autostart_dir).unwrap();
        fs::write(xdg_autostart_dir.join("autostart"), "#!/bin/sh\n").unwrap();

        // SAFETY: test runs single-threaded within this process's env mutation.
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.join("xdg"));
            env::set_var("HOME", dir.join("home"));
        }

        let found = find_config_program();
        assert_eq!(found, Some(xdg_autostart_dir.join("autostart")));

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
            env::remove_var("HOME");
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn find_config_program_is_none_when_nothing_exists() {
        let dir = env::temp_dir().join(format!(
            "labwc-core-startup-test-empty-{:?}",
            std::thread::current().id()
        ));
        // SAFETY: test runs single-threaded within this process's env mutation.
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.join("xdg"));
            env::set_var("HOME", dir.join("home"));
        }

        assert_eq!(find_config_program(), None);

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
            env::remove_var("HOME");
        }
    }
}
