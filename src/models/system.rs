// Load, memory, host identity and the aggregate response

use serde::{Deserialize, Serialize};

use super::{InterfaceStat, ProcessSnapshot, StorageSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAvgStat {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMemoryStat {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
    pub free: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfoStat {
    pub hostname: String,
    pub uptime: u64,
    pub boot_time: u64,
    pub procs: u64,
    pub os: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub kernel_arch: String,
    pub host_id: String,
}

/// Full response body. Built once per authorized request and never reused.
///
/// Collection sequences always serialize as arrays (possibly empty); single-record
/// categories serialize as `null` when the OS query failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub procs: Vec<ProcessSnapshot>,
    pub storage: Vec<StorageSnapshot>,
    pub sysload: Option<LoadAvgStat>,
    pub memload: Option<VirtualMemoryStat>,
    pub host: Option<HostInfoStat>,
    pub net: Vec<InterfaceStat>,
}
