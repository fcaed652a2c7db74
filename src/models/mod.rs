// Snapshot models (JSON wire format of the telemetry endpoint)

mod network;
mod process;
mod storage;
mod system;

pub use network::{InterfaceAddr, InterfaceStat};
pub use process::ProcessSnapshot;
pub use storage::{PartitionStat, StorageSnapshot, UsageStat};
pub use system::{AggregateSnapshot, HostInfoStat, LoadAvgStat, VirtualMemoryStat};
