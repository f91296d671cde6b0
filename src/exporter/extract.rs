use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use ipfix::Value;
use crate::flows::FlowRecord;
use super::Error;

/// How a data record value is taken from a flow record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rule {
    FlowStart,
    FlowEnd,
    SourceIpv4,
    DestinationIpv4,
    SourceIpv6,
    DestinationIpv6,
    SourcePort,
    DestinationPort,
    Protocol,
    PacketTotal,
    OctetTotal,
    PacketDelta,
    OctetDelta,
    ReversePacketTotal,
    ReverseOctetTotal,
    ReversePacketDelta,
    ReverseOctetDelta,
    SourcePodName,
    SourcePodNamespace,
    SourceNodeName,
    DestinationPodName,
    DestinationPodNamespace,
    DestinationNodeName,
    DestinationClusterIpv4,
    DestinationClusterIpv6,
    DestinationServicePortName,
}

impl Rule {
    pub fn lookup(name: &str) -> Option<Rule> {
        Some(match name {
            "flowStartSeconds"           => Rule::FlowStart,
            "flowEndSeconds"             => Rule::FlowEnd,
            "sourceIPv4Address"          => Rule::SourceIpv4,
            "destinationIPv4Address"     => Rule::DestinationIpv4,
            "sourceIPv6Address"          => Rule::SourceIpv6,
            "destinationIPv6Address"     => Rule::DestinationIpv6,
            "sourceTransportPort"        => Rule::SourcePort,
            "destinationTransportPort"   => Rule::DestinationPort,
            "protocolIdentifier"         => Rule::Protocol,
            "packetTotalCount"           => Rule::PacketTotal,
            "octetTotalCount"            => Rule::OctetTotal,
            "packetDeltaCount"           => Rule::PacketDelta,
            "octetDeltaCount"            => Rule::OctetDelta,
            "reversePacketTotalCount"    => Rule::ReversePacketTotal,
            "reverseOctetTotalCount"     => Rule::ReverseOctetTotal,
            "reversePacketDeltaCount"    => Rule::ReversePacketDelta,
            "reverseOctetDeltaCount"     => Rule::ReverseOctetDelta,
            "sourcePodName"              => Rule::SourcePodName,
            "sourcePodNamespace"         => Rule::SourcePodNamespace,
            "sourceNodeName"             => Rule::SourceNodeName,
            "destinationPodName"         => Rule::DestinationPodName,
            "destinationPodNamespace"    => Rule::DestinationPodNamespace,
            "destinationNodeName"        => Rule::DestinationNodeName,
            "destinationClusterIP"       => Rule::DestinationClusterIpv4,
            "destinationClusterIPv6"     => Rule::DestinationClusterIpv6,
            "destinationServicePortName" => Rule::DestinationServicePortName,
            _                            => return None,
        })
    }

    pub fn extract(self, record: &FlowRecord) -> Result<Value, Error> {
        let conn = &record.conn;
        let orig = &conn.tuple_orig;
        let rply = &conn.tuple_reply;

        Ok(match self {
            Rule::FlowStart       => Value::DateTimeSeconds(conn.start_time.timestamp()),
            Rule::FlowEnd         => Value::DateTimeSeconds(conn.stop_time.timestamp()),
            Rule::SourceIpv4      => Value::Ipv4(ipv4("sourceIPv4Address", orig.source_address)?),
            Rule::DestinationIpv4 => Value::Ipv4(ipv4("destinationIPv4Address", rply.source_address)?),
            Rule::SourceIpv6      => Value::Ipv6(ipv6(orig.source_address)),
            Rule::DestinationIpv6 => Value::Ipv6(ipv6(rply.source_address)),
            Rule::SourcePort      => Value::Unsigned16(orig.source_port),
            Rule::DestinationPort => Value::Unsigned16(rply.source_port),
            Rule::Protocol        => Value::Unsigned8(orig.protocol),

            Rule::PacketTotal        => Value::Unsigned64(conn.original_packets),
            Rule::OctetTotal         => Value::Unsigned64(conn.original_bytes),
            Rule::PacketDelta        => Value::Unsigned64(delta(conn.original_packets, record.prev_packets)),
            Rule::OctetDelta         => Value::Unsigned64(delta(conn.original_bytes, record.prev_bytes)),
            Rule::ReversePacketTotal => Value::Unsigned64(conn.reverse_packets),
            Rule::ReverseOctetTotal  => Value::Unsigned64(conn.reverse_bytes),
            Rule::ReversePacketDelta => Value::Unsigned64(delta(conn.reverse_packets, record.prev_reverse_packets)),
            Rule::ReverseOctetDelta  => Value::Unsigned64(delta(conn.reverse_bytes, record.prev_reverse_bytes)),

            Rule::DestinationClusterIpv4 => Value::Ipv4(ipv4("destinationClusterIP", conn.destination_cluster_ip)?),
            Rule::DestinationClusterIpv6 => Value::Ipv6(ipv6(conn.destination_cluster_ip)),

            Rule::SourcePodName              => text(&conn.source_pod_name),
            Rule::SourcePodNamespace         => text(&conn.source_pod_namespace),
            Rule::SourceNodeName             => text(&conn.source_node_name),
            Rule::DestinationPodName         => text(&conn.destination_pod_name),
            Rule::DestinationPodNamespace    => text(&conn.destination_pod_namespace),
            Rule::DestinationNodeName        => text(&conn.destination_node_name),
            Rule::DestinationServicePortName => text(&conn.destination_service_port_name),
        })
    }
}

fn text(s: &str) -> Value {
    Value::String(s.to_owned())
}

// counters that moved backwards report no traffic instead of wrapping
fn delta(current: u64, prev: u64) -> u64 {
    current.saturating_sub(prev)
}

fn ipv4(name: &'static str, addr: Option<IpAddr>) -> Result<Ipv4Addr, Error> {
    match addr {
        None                 => Ok(Ipv4Addr::UNSPECIFIED),
        Some(IpAddr::V4(ip)) => Ok(ip),
        Some(addr)           => Err(Error::Address { name, addr }),
    }
}

fn ipv6(addr: Option<IpAddr>) -> Ipv6Addr {
    match addr {
        None                 => Ipv6Addr::UNSPECIFIED,
        Some(IpAddr::V4(ip)) => ip.to_ipv6_mapped(),
        Some(IpAddr::V6(ip)) => ip,
    }
}
