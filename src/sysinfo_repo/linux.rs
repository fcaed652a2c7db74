// Linux-specific helpers: /proc process details, mount table, machine id, /sys/class/net.
// Parsers are plain functions over file contents so they can be tested on any host.

#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use crate::models::PartitionStat;
use std::collections::HashSet;

/// Id and thread fields from /proc/<pid>/status.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct ProcStatus {
    pub uids: Vec<u32>,
    pub gids: Vec<u32>,
    pub groups: Vec<u32>,
    pub threads: u32,
}

pub(super) fn read_proc_status(pid: u32) -> Option<ProcStatus> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
        return Some(parse_proc_status(&content));
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = pid;
        None
    }
}

pub(super) fn parse_proc_status(content: &str) -> ProcStatus {
    let ids = |v: &str| -> Vec<u32> { v.split_whitespace().filter_map(|s| s.parse().ok()).collect() };
    let mut status = ProcStatus::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key {
            "Uid" => status.uids = ids(value),
            "Gid" => status.gids = ids(value),
            "Groups" => status.groups = ids(value),
            "Threads" => status.threads = value.trim().parse().unwrap_or(0),
            _ => {}
        }
    }
    status
}

/// Nice value from /proc/<pid>/stat.
pub(super) fn read_nice(pid: u32) -> Option<i32> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
        return parse_stat_nice(&content);
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = pid;
        None
    }
}

// comm (field 2) may contain spaces and parens; fields are counted after the last ')'.
pub(super) fn parse_stat_nice(content: &str) -> Option<i32> {
    let rest = &content[content.rfind(')')? + 1..];
    // rest starts at field 3 (state); nice is field 19.
    rest.split_whitespace().nth(16)?.parse().ok()
}

/// Mounted partitions from /proc/self/mounts. Without `all`, only filesystems that
/// /proc/filesystems lists as device-backed are kept.
pub(super) fn read_partitions(all: bool) -> Option<Vec<PartitionStat>> {
    #[cfg(target_os = "linux")]
    {
        let mounts = std::fs::read_to_string("/proc/self/mounts").ok()?;
        let partitions = parse_mounts(&mounts);
        if all {
            return Some(partitions);
        }
        let filesystems = std::fs::read_to_string("/proc/filesystems").ok()?;
        let physical = parse_physical_filesystems(&filesystems);
        return Some(
            partitions
                .into_iter()
                .filter(|p| physical.contains(&p.fstype))
                .collect(),
        );
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = all;
        None
    }
}

pub(super) fn parse_mounts(content: &str) -> Vec<PartitionStat> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mountpoint = fields.next()?;
            let fstype = fields.next()?;
            let opts = fields.next().unwrap_or_default();
            Some(PartitionStat {
                device: unescape_mount_field(device),
                mountpoint: unescape_mount_field(mountpoint),
                fstype: fstype.to_string(),
                opts: opts
                    .split(',')
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect()
}

/// Filesystem types without the `nodev` marker.
pub(super) fn parse_physical_filesystems(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter(|line| !line.starts_with("nodev"))
        .map(|line| line.trim().to_string())
        .filter(|fs| !fs.is_empty())
        .collect()
}

// Spaces, tabs, newlines and backslashes are written as 3-digit octal escapes (e.g. \040).
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let code = (bytes[i + 1] - b'0') as u32 * 64
                + (bytes[i + 2] - b'0') as u32 * 8
                + (bytes[i + 3] - b'0') as u32;
            if let Ok(b) = u8::try_from(code) {
                out.push(b);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Read /etc/machine-id (falls back to the D-Bus copy).
pub(super) fn read_machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(v) = std::fs::read_to_string(path) {
                let v = v.trim();
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn read_net_attr(interface_name: &str, attr: &str) -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/{}", interface_name, attr);
        return std::fs::read_to_string(path)
            .ok()
            .map(|s| s.trim().to_string());
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (interface_name, attr);
        None
    }
}

pub(super) fn interface_index(interface_name: &str) -> Option<u32> {
    read_net_attr(interface_name, "ifindex")?.parse().ok()
}

pub(super) fn interface_mtu(interface_name: &str) -> Option<u32> {
    read_net_attr(interface_name, "mtu")?.parse().ok()
}

pub(super) fn interface_flags(interface_name: &str) -> Option<Vec<String>> {
    let raw = read_net_attr(interface_name, "flags")?;
    let bits = u32::from_str_radix(raw.trim_start_matches("0x"), 16).ok()?;
    Some(decode_interface_flags(bits))
}

/// IFF_* bits to the names used in the JSON output.
pub(super) fn decode_interface_flags(bits: u32) -> Vec<String> {
    const FLAGS: [(u32, &str); 5] = [
        (0x1, "up"),
        (0x2, "broadcast"),
        (0x8, "loopback"),
        (0x10, "pointtopoint"),
        (0x1000, "multicast"),
    ];
    FLAGS
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| name.to_string())
        .collect()
}
