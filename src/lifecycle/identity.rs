//! Master process identity.
//!
//! Task workers never observe the master's start, so every role records the
//! master pid from the engine's server handle. The engine exports it to the
//! process environment once, before any role thread runs, so later-spawned
//! processes inherit it.

use std::sync::OnceLock;

/// Environment variable carrying the master pid.
pub const MASTER_PID_ENV: &str = "WORKER_SERVER_MASTER_PID";

static RECORDED: OnceLock<u32> = OnceLock::new();

/// Access to the one cross-role value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterPid(u32);

impl MasterPid {
    /// Record `pid`. The first pid recorded in a process wins.
    pub fn record(pid: u32) -> MasterPid {
        let recorded = *RECORDED.get_or_init(|| pid);
        if recorded != pid {
            tracing::warn!(recorded, reported = pid, "Master pid already recorded");
        }
        MasterPid(recorded)
    }

    /// The recorded pid, falling back to an inherited environment value.
    pub fn current() -> Option<MasterPid> {
        RECORDED
            .get()
            .copied()
            .or_else(inherited)
            .map(MasterPid)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Write `pid` to [`MASTER_PID_ENV`].
    ///
    /// Call before spawning role threads; the environment must not change
    /// while other threads may read it.
    pub fn export(pid: u32) {
        std::env::set_var(MASTER_PID_ENV, pid.to_string());
    }
}

fn inherited() -> Option<u32> {
    std::env::var(MASTER_PID_ENV).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_single_assignment() {
        let first = MasterPid::record(31337);
        let second = MasterPid::record(1);
        assert_eq!(first, second);
        assert_eq!(MasterPid::current(), Some(first));
    }

    #[test]
    fn export_sets_environment() {
        MasterPid::export(4711);
        assert_eq!(inherited(), Some(4711));
    }
}
