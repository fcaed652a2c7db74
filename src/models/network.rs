// Network interface models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceAddr {
    /// Address in CIDR form, e.g. `192.168.1.10/24`.
    pub addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStat {
    pub index: u32,
    pub mtu: u32,
    pub name: String,
    pub hardwareaddr: String,
    pub flags: Vec<String>,
    pub addrs: Vec<InterfaceAddr>,
}
