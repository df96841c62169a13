use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::process::CommandExt;

const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Spawns the player detached from the terminal: no inherited stdio and its
/// own process group, so terminal signals aimed at the TUI never reach it.
#[cfg(unix)]
pub(crate) fn spawn_player(mut cmd: ProcessCommand) -> Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    unsafe {
        cmd.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGTERM, libc::SIG_DFL);
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
    cmd.spawn().context("failed to spawn audio player")
}

#[cfg(not(unix))]
pub(crate) fn spawn_player(mut cmd: ProcessCommand) -> Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn().context("failed to spawn audio player")
}

/// Asks the player group to exit, then kills it if it lingers.
pub(crate) fn terminate(child: &mut Child) {
    if signal_exit(child) {
        reap(child);
    }
}

/// Signals the player group right away and waits out the grace period on a
/// helper thread. `cleanup` runs once the player is gone.
pub(crate) fn terminate_detached(
    child: Arc<Mutex<Child>>,
    cleanup: impl FnOnce() + Send + 'static,
) -> thread::JoinHandle<()> {
    let running = match child.lock() {
        Ok(mut child) => signal_exit(&mut child),
        Err(_) => false,
    };
    thread::spawn(move || {
        if running {
            if let Ok(mut child) = child.lock() {
                reap(&mut child);
            }
        }
        cleanup();
    })
}

/// Returns `false` when the player had already exited.
fn signal_exit(child: &mut Child) -> bool {
    if matches!(child.try_wait(), Ok(Some(_))) {
        return false;
    }

    #[cfg(unix)]
    unsafe {
        let pgid = child.id() as libc::pid_t;
        let _ = libc::kill(-pgid, libc::SIGTERM);
    }
    true
}

fn reap(child: &mut Child) {
    let deadline = Instant::now() + TERMINATE_GRACE;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(?status, "audio player exited");
                return;
            }
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(_) => break,
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}
