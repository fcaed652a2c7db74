// Point-in-time telemetry via sysinfo, plus /proc and /sys on Linux

mod linux;

use crate::config::CollectionConfig;
use crate::models::*;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use sysinfo::{
    Disk, Disks, Networks, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System,
    Users,
};
use tracing::instrument;

/// Source of the per-request aggregate. Implementations never fail: whatever could not
/// be collected is left empty.
pub trait Collector: Send + Sync + 'static {
    fn collect(&self) -> impl Future<Output = AggregateSnapshot> + Send;
}

/// Builds a fresh snapshot on every call. Holds no sysinfo state between calls, so
/// concurrent requests never contend on a lock.
#[derive(Debug, Clone, Default)]
pub struct SysinfoRepo {
    config: CollectionConfig,
}

impl SysinfoRepo {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }

    /// Runs the six sub-collections concurrently and assembles the aggregate.
    /// They touch disjoint fields and read-only OS state, so their interleaving
    /// does not affect the result.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "collect"))]
    pub async fn collect_snapshot(&self) -> AggregateSnapshot {
        let cpu_window = self.config.cpu_sample_window();
        let all_partitions = self.config.all_partitions;
        let (procs, storage, sysload, memload, host, net) = tokio::join!(
            blocking("procs", move || collect_processes(cpu_window)),
            blocking("storage", move || collect_storage(all_partitions)),
            blocking("sysload", collect_load),
            blocking("memload", collect_memory),
            blocking("host", collect_host),
            blocking("net", collect_network),
        );
        let snapshot = AggregateSnapshot {
            procs: procs.unwrap_or_default(),
            storage: storage.unwrap_or_default(),
            sysload,
            memload,
            host,
            net: net.unwrap_or_default(),
        };
        tracing::debug!(
            procs = snapshot.procs.len(),
            storage = snapshot.storage.len(),
            net = snapshot.net.len(),
            "snapshot collected"
        );
        snapshot
    }
}

impl Collector for SysinfoRepo {
    fn collect(&self) -> impl Future<Output = AggregateSnapshot> + Send {
        self.collect_snapshot()
    }
}

/// Collect-or-default: runs `f`, logging and discarding any error.
pub fn best_effort<T>(category: &str, f: impl FnOnce() -> anyhow::Result<T>) -> Option<T> {
    match f() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(category, error = %e, "collection failed, leaving unset");
            None
        }
    }
}

/// [`best_effort`] on the blocking pool; a panicked task also yields `None`.
async fn blocking<T, F>(category: &'static str, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || best_effort(category, f)).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(category, error = %e, "collection task join failed");
            None
        }
    }
}

#[instrument(fields(repo = "sysinfo", operation = "collect_processes"))]
fn collect_processes(cpu_window: Duration) -> anyhow::Result<Vec<ProcessSnapshot>> {
    anyhow::ensure!(
        sysinfo::IS_SUPPORTED_SYSTEM,
        "process listing is not supported on this platform"
    );
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::everything(),
    );
    // CPU usage is a delta between two refreshes.
    if !cpu_window.is_zero() {
        std::thread::sleep(cpu_window);
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu(),
        );
    }
    let users = Users::new_with_refreshed_list();
    let total_memory = sys.total_memory();
    let mut procs: Vec<ProcessSnapshot> = sys
        .processes()
        .values()
        .filter(|p| is_process(p))
        .map(|p| process_snapshot(p, &users, total_memory))
        .collect();
    procs.sort_by_key(|p| p.pid);
    Ok(procs)
}

// On Linux, threads show up in the process table when tasks are refreshed.
fn is_process(p: &Process) -> bool {
    p.thread_kind().is_none()
}

fn process_snapshot(p: &Process, users: &Users, total_memory: u64) -> ProcessSnapshot {
    let pid = p.pid().as_u32();
    let status = linux::read_proc_status(pid).unwrap_or_default();
    let nthreads = if status.threads > 0 {
        status.threads
    } else {
        p.tasks().map(|t| t.len() as u32).unwrap_or(0)
    };
    let mem_percent = if total_memory > 0 {
        (p.memory() as f64 / total_memory as f64 * 100.0) as f32
    } else {
        0.0
    };
    ProcessSnapshot {
        pid,
        ppid: p.parent().map(|pp| pp.as_u32()).unwrap_or(0),
        uids: status.uids,
        gids: status.gids,
        groups: status.groups,
        nthreads,
        user: p
            .user_id()
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|u| u.name().to_string())
            .unwrap_or_default(),
        nice: linux::read_nice(pid).unwrap_or(0),
        name: p.name().to_string_lossy().into_owned(),
        executable: path_string(p.exe()),
        cmdline: p
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect(),
        cwd: path_string(p.cwd()),
        cpu_percent: p.cpu_usage() as f64,
        mem_percent,
        create_time: p.start_time().saturating_mul(1000),
        is_running: is_running(p.status()),
    }
}

// A zombie still exists until its parent reaps it.
fn is_running(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Dead)
}

fn path_string(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[instrument(fields(repo = "sysinfo", operation = "collect_storage"))]
fn collect_storage(all_partitions: bool) -> anyhow::Result<Vec<StorageSnapshot>> {
    let disks = Disks::new_with_refreshed_list();
    // sysinfo's own list already leaves out pseudo filesystems; it is the fallback
    // where the mount table can't be read.
    let partitions = linux::read_partitions(all_partitions)
        .unwrap_or_else(|| disks.list().iter().map(partition_from_disk).collect());
    Ok(partitions
        .into_iter()
        .map(|partition| {
            let usage = best_effort("storage.usage", || usage_at(&partition, disks.list()));
            StorageSnapshot { partition, usage }
        })
        .collect())
}

fn partition_from_disk(d: &Disk) -> PartitionStat {
    PartitionStat {
        device: d.name().to_string_lossy().into_owned(),
        mountpoint: d.mount_point().to_string_lossy().into_owned(),
        fstype: d.file_system().to_string_lossy().into_owned(),
        opts: vec![if d.is_read_only() { "ro" } else { "rw" }.to_string()],
    }
}

/// Usage queried at the mountpoint itself, so pseudo filesystems (tmpfs, proc, ...)
/// report too. `used` excludes reserved blocks; the percentage is over `used + free`.
#[cfg(unix)]
fn usage_at(partition: &PartitionStat, _disks: &[Disk]) -> anyhow::Result<UsageStat> {
    let stat = nix::sys::statvfs::statvfs(partition.mountpoint.as_str())
        .map_err(|e| anyhow::anyhow!("statvfs {}: {}", partition.mountpoint, e))?;
    let frsize = stat.fragment_size() as u64;
    let blocks = stat.blocks() as u64;
    let total = blocks.saturating_mul(frsize);
    let free = (stat.blocks_available() as u64).saturating_mul(frsize);
    let used = blocks
        .saturating_sub(stat.blocks_free() as u64)
        .saturating_mul(frsize);
    Ok(usage_stat(partition, total, free, used))
}

#[cfg(not(unix))]
fn usage_at(partition: &PartitionStat, disks: &[Disk]) -> anyhow::Result<UsageStat> {
    let disk = disks
        .iter()
        .find(|d| d.mount_point() == Path::new(&partition.mountpoint))
        .ok_or_else(|| anyhow::anyhow!("no usage statistics for {}", partition.mountpoint))?;
    let total = disk.total_space();
    let free = disk.available_space();
    Ok(usage_stat(partition, total, free, total.saturating_sub(free)))
}

fn usage_stat(partition: &PartitionStat, total: u64, free: u64, used: u64) -> UsageStat {
    UsageStat {
        path: partition.mountpoint.clone(),
        fstype: partition.fstype.clone(),
        total,
        free,
        used,
        used_percent: percent(used, used.saturating_add(free)),
    }
}

fn collect_load() -> anyhow::Result<LoadAvgStat> {
    anyhow::ensure!(
        cfg!(unix),
        "load average is not available on this platform"
    );
    let load = System::load_average();
    Ok(LoadAvgStat {
        load1: load.one,
        load5: load.five,
        load15: load.fifteen,
    })
}

fn collect_memory() -> anyhow::Result<VirtualMemoryStat> {
    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    anyhow::ensure!(total > 0, "memory statistics unavailable");
    let available = sys.available_memory();
    let used = total.saturating_sub(available);
    Ok(VirtualMemoryStat {
        total,
        available,
        used,
        used_percent: percent(used, total),
        free: sys.free_memory(),
        swap_total: sys.total_swap(),
        swap_used: sys.used_swap(),
        swap_free: sys.free_swap(),
    })
}

fn collect_host() -> anyhow::Result<HostInfoStat> {
    let hostname =
        System::host_name().ok_or_else(|| anyhow::anyhow!("host name unavailable"))?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing(),
    );
    Ok(HostInfoStat {
        hostname,
        uptime: System::uptime(),
        boot_time: System::boot_time(),
        procs: sys.processes().values().filter(|p| is_process(p)).count() as u64,
        os: std::env::consts::OS.into(),
        platform: System::distribution_id(),
        platform_version: System::os_version().unwrap_or_default(),
        kernel_version: System::kernel_version().unwrap_or_default(),
        kernel_arch: std::env::consts::ARCH.into(),
        host_id: linux::read_machine_id().unwrap_or_default(),
    })
}

fn collect_network() -> anyhow::Result<Vec<InterfaceStat>> {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<InterfaceStat> = networks
        .list()
        .iter()
        .map(|(name, data)| {
            let mac = data.mac_address().to_string();
            InterfaceStat {
                index: linux::interface_index(name).unwrap_or(0),
                mtu: linux::interface_mtu(name).unwrap_or(0),
                name: name.clone(),
                hardwareaddr: if mac == "00:00:00:00:00:00" {
                    String::new()
                } else {
                    mac
                },
                flags: linux::interface_flags(name).unwrap_or_default(),
                addrs: data
                    .ip_networks()
                    .iter()
                    .map(|n| InterfaceAddr {
                        addr: format!("{}/{}", n.addr, n.prefix),
                    })
                    .collect(),
            }
        })
        .collect();
    interfaces.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
    Ok(interfaces)
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
