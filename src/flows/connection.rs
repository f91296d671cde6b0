use std::fmt;
use std::net::IpAddr;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(default)]
pub struct Tuple {
    pub source_address:      Option<IpAddr>,
    pub destination_address: Option<IpAddr>,
    pub protocol:            u8,
    pub source_port:         u16,
    pub destination_port:    u16,
}

/// Snapshot of a tracked connection as reported by the conntrack poller.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub start_time:                    DateTime<Utc>,
    pub stop_time:                     DateTime<Utc>,
    pub original_packets:              u64,
    pub original_bytes:                u64,
    pub reverse_packets:               u64,
    pub reverse_bytes:                 u64,
    pub tuple_orig:                    Tuple,
    pub tuple_reply:                   Tuple,
    pub source_pod_name:               String,
    pub source_pod_namespace:          String,
    pub source_node_name:              String,
    pub destination_pod_name:          String,
    pub destination_pod_namespace:     String,
    pub destination_node_name:         String,
    pub destination_service_port_name: String,
    pub destination_cluster_ip:        Option<IpAddr>,
}

impl Connection {
    pub fn key(&self) -> Tuple {
        self.tuple_orig.clone()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let addr = |a: &Option<IpAddr>| a.map(|a| a.to_string()).unwrap_or_else(|| "-".to_owned());
        write!(f, "{}:{} -> {}:{} ({})",
               addr(&self.source_address),      self.source_port,
               addr(&self.destination_address), self.destination_port,
               self.protocol,
        )
    }
}
