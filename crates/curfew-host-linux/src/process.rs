//! Process lookup and termination utilities

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use curfew_host_api::{HostError, HostResult};

/// How long a process gets to exit after SIGTERM before SIGKILL
pub const TERMINATE_GRACE: Duration = Duration::from_secs(3);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Short process name from `/proc/<pid>/comm`
pub fn process_name(pid: u32) -> Option<String> {
    let comm = std::fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    let name = comm.trim_end();
    (!name.is_empty()).then(|| name.to_string())
}

/// Whether `pid` refers to a live (non-zombie) process
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid_raw) = i32::try_from(pid) else {
        return false;
    };

    match signal::kill(Pid::from_raw(pid_raw), None) {
        Ok(()) | Err(Errno::EPERM) => !is_zombie(pid),
        Err(_) => false,
    }
}

fn is_zombie(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };

    // The state field follows the parenthesised command name, which may contain spaces
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state == "Z")
}

/// Send SIGTERM, wait up to `grace` for the process to exit, then SIGKILL
pub fn terminate_process(pid: u32, grace: Duration) -> HostResult<()> {
    let target = checked_pid(pid)?;

    if !send_signal(target, Signal::SIGTERM)? {
        return Err(HostError::ProcessGone(pid));
    }
    debug!(pid, "Sent SIGTERM");

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if !is_alive(pid) {
            debug!(pid, "Process exited after SIGTERM");
            return Ok(());
        }
        std::thread::sleep(EXIT_POLL_INTERVAL);
    }

    if send_signal(target, Signal::SIGKILL)? {
        info!(pid, grace_secs = grace.as_secs(), "Process ignored SIGTERM, sent SIGKILL");
    }
    Ok(())
}

/// Reject pids that would address a process group or the system
fn checked_pid(pid: u32) -> HostResult<Pid> {
    if pid <= 1 || pid == std::process::id() {
        return Err(HostError::PermissionDenied(format!("refusing to signal pid {}", pid)));
    }

    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| HostError::Internal(format!("pid {} out of range", pid)))
}

/// Returns `false` if the process no longer exists
fn send_signal(pid: Pid, sig: Signal) -> HostResult<bool> {
    match signal::kill(pid, sig) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(Errno::EPERM) => Err(HostError::PermissionDenied(format!(
            "not allowed to send {} to pid {}",
            sig, pid
        ))),
        Err(e) => Err(HostError::Internal(format!("Failed to send {}: {}", sig, e))),
    }
}
