use std::time::Duration;

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Whether a process with this pid exists (zombies included).
pub fn pid_is_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Poll until `pid` is gone or `timeout` expires. Returns `true` if gone.
pub async fn wait_until_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if !pid_is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !pid_is_alive(pid)
}
