// Shared test helpers

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use sysprobe::auth::ApiKeyGate;
use sysprobe::models::*;
use sysprobe::sysinfo_repo::Collector;

pub const SECRET: &str = "s3cr3t";

/// Returns a canned snapshot and counts how often it was asked for.
#[derive(Default)]
pub struct CountingCollector {
    pub calls: AtomicUsize,
    pub snapshot: AggregateSnapshot,
}

impl CountingCollector {
    pub fn new(snapshot: AggregateSnapshot) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            snapshot,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Collector for CountingCollector {
    fn collect(&self) -> impl Future<Output = AggregateSnapshot> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.snapshot.clone();
        async move { snapshot }
    }
}

pub fn gate() -> ApiKeyGate {
    ApiKeyGate::new(SECRET).unwrap()
}

pub fn sample_snapshot() -> AggregateSnapshot {
    AggregateSnapshot {
        procs: vec![ProcessSnapshot {
            pid: 1,
            name: "init".into(),
            cmdline: vec!["/sbin/init".into()],
            is_running: true,
            ..Default::default()
        }],
        storage: vec![StorageSnapshot {
            partition: PartitionStat {
                device: "/dev/sda1".into(),
                mountpoint: "/".into(),
                fstype: "ext4".into(),
                opts: vec!["rw".into()],
            },
            usage: Some(UsageStat {
                path: "/".into(),
                fstype: "ext4".into(),
                total: 100,
                free: 40,
                used: 60,
                used_percent: 60.0,
            }),
        }],
        sysload: Some(LoadAvgStat {
            load1: 0.5,
            load5: 0.25,
            load15: 0.1,
        }),
        memload: None,
        host: None,
        net: vec![InterfaceStat {
            index: 1,
            mtu: 65536,
            name: "lo".into(),
            hardwareaddr: String::new(),
            flags: vec!["up".into(), "loopback".into()],
            addrs: vec![InterfaceAddr {
                addr: "127.0.0.1/8".into(),
            }],
        }],
    }
}
