// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-local process liveness check used by stale-lock reclamation.

/// Returns true if a process with `pid` exists on the local host.
///
/// Sends the null signal (`kill(pid, 0)` via `nix`, no signal actually
/// delivered). `ESRCH` means the process is gone; `EPERM` still means it
/// exists, just owned by another user.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    // No portable liveness probe outside POSIX hosts; treat as alive so a
    // live holder is never reclaimed by mistake. Such a lock still expires
    // by TTL.
    true
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
