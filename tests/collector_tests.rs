// Real collection against the host running the tests

use sysprobe::config::CollectionConfig;
use sysprobe::sysinfo_repo::{Collector, SysinfoRepo};

fn repo(all_partitions: bool) -> SysinfoRepo {
    SysinfoRepo::new(CollectionConfig {
        all_partitions,
        cpu_sample_ms: 0,
    })
}

#[tokio::test]
async fn test_current_process_is_listed() {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return;
    }
    let snapshot = repo(false).collect().await;
    let me = std::process::id();
    let proc = snapshot
        .procs
        .iter()
        .find(|p| p.pid == me)
        .expect("test process in snapshot");
    assert!(!proc.name.is_empty());
    assert!(!proc.cmdline.is_empty());
    assert!(proc.is_running);
    assert!(proc.create_time > 0);
    assert!(snapshot.procs.windows(2).all(|w| w[0].pid < w[1].pid));
}

#[tokio::test]
async fn test_cpu_sampling_window() {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return;
    }
    let repo = SysinfoRepo::new(CollectionConfig {
        all_partitions: false,
        cpu_sample_ms: 50,
    });
    let snapshot = repo.collect().await;
    assert!(!snapshot.procs.is_empty());
    assert!(snapshot.procs.iter().all(|p| p.cpu_percent >= 0.0));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_linux_categories_populated() {
    let snapshot = repo(false).collect().await;
    assert!(snapshot.sysload.is_some());
    let mem = snapshot.memload.expect("memory stats on linux");
    assert!(mem.total > 0);
    assert!(mem.used <= mem.total);
    let host = snapshot.host.expect("host info on linux");
    assert_eq!(host.os, "linux");
    assert!(host.procs > 0);

    let me = std::process::id();
    let proc = snapshot.procs.iter().find(|p| p.pid == me).unwrap();
    assert_eq!(proc.uids.len(), 4);
    assert!(proc.nthreads >= 1);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_pseudo_partitions_report_usage() {
    let all = repo(true).collect().await;
    let procfs = all
        .storage
        .iter()
        .find(|s| s.partition.fstype == "proc")
        .expect("proc mount when pseudo filesystems are included");
    let usage = procfs.usage.as_ref().expect("usage queried at /proc");
    assert_eq!(usage.path, procfs.partition.mountpoint);
    assert_eq!(usage.fstype, "proc");

    // /dev/shm is tmpfs on most hosts; fall back to whichever tmpfs is mounted.
    let tmpfs = all
        .storage
        .iter()
        .filter(|s| s.partition.fstype == "tmpfs")
        .min_by_key(|s| s.partition.mountpoint != "/dev/shm");
    if let Some(tmpfs) = tmpfs {
        let usage = tmpfs.usage.as_ref().expect("usage queried at a tmpfs mount");
        assert_eq!(usage.fstype, "tmpfs");
        assert!(usage.used + usage.free <= usage.total);
    }

    let physical = repo(false).collect().await;
    assert!(physical.storage.iter().all(|s| s.partition.fstype != "proc"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_unreaped_child_is_running() {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    // Not waited on yet, so it lingers as a zombie.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let snapshot = repo(false).collect().await;
    let pid = child.id();
    child.wait().unwrap();

    let zombie = snapshot
        .procs
        .iter()
        .find(|p| p.pid == pid)
        .expect("unreaped child listed");
    assert!(zombie.is_running);
}

#[tokio::test]
async fn test_storage_entries_have_mountpoints() {
    let snapshot = repo(false).collect().await;
    for s in &snapshot.storage {
        assert!(!s.partition.mountpoint.is_empty());
        if let Some(usage) = &s.usage {
            assert_eq!(usage.path, s.partition.mountpoint);
            assert!(usage.used <= usage.total);
        }
    }
}
