// Per-process snapshot

use serde::{Deserialize, Serialize};

/// One OS process at collection time. Fields that could not be read stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub ppid: u32,
    /// Real, effective, saved and filesystem user ids (Linux order).
    pub uids: Vec<u32>,
    pub gids: Vec<u32>,
    /// Supplementary group ids.
    pub groups: Vec<u32>,
    pub nthreads: u32,
    pub user: String,
    pub nice: i32,
    pub name: String,
    pub executable: String,
    pub cmdline: Vec<String>,
    pub cwd: String,
    #[serde(rename = "cpuperc")]
    pub cpu_percent: f64,
    #[serde(rename = "memperc")]
    pub mem_percent: f32,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "createtime")]
    pub create_time: u64,
    #[serde(rename = "isrunning")]
    pub is_running: bool,
}
