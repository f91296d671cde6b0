use crate::element::*;
use crate::element::DataType::{DateTimeSeconds, Ipv4Address, Ipv6Address, Unsigned16, Unsigned64, Unsigned8};
use crate::Error;

pub trait Registry {
    fn element(&self, name: &str, enterprise: u32) -> Result<InfoElement, Error>;
}

// name, id, type, reversible
const IANA: &[(&str, u16, DataType, bool)] = &[
    ("octetDeltaCount",          1,   Unsigned64,      true),
    ("packetDeltaCount",         2,   Unsigned64,      true),
    ("protocolIdentifier",       4,   Unsigned8,       false),
    ("sourceTransportPort",      7,   Unsigned16,      false),
    ("sourceIPv4Address",        8,   Ipv4Address,     false),
    ("destinationTransportPort", 11,  Unsigned16,      false),
    ("destinationIPv4Address",   12,  Ipv4Address,     false),
    ("sourceIPv6Address",        27,  Ipv6Address,     false),
    ("destinationIPv6Address",   28,  Ipv6Address,     false),
    ("octetTotalCount",          85,  Unsigned64,      true),
    ("packetTotalCount",         86,  Unsigned64,      true),
    ("flowStartSeconds",         150, DateTimeSeconds, true),
    ("flowEndSeconds",           151, DateTimeSeconds, true),
];

const ANTREA: &[(&str, u16, DataType)] = &[
    ("sourcePodNamespace",         100, DataType::String),
    ("sourcePodName",              101, DataType::String),
    ("destinationPodNamespace",    102, DataType::String),
    ("destinationPodName",         103, DataType::String),
    ("sourceNodeName",             104, DataType::String),
    ("destinationNodeName",        105, DataType::String),
    ("destinationClusterIP",       106, Ipv4Address),
    ("destinationClusterIPv6",     107, Ipv6Address),
    ("destinationServicePortName", 109, DataType::String),
];

/// Built-in registry of the IANA, RFC 5103 reverse and Antrea elements.
#[derive(Clone, Debug, Default)]
pub struct Elements;

impl Elements {
    pub fn new() -> Self {
        Self
    }

    fn iana(&self, name: &str) -> Option<InfoElement> {
        IANA.iter().find(|e| e.0 == name).map(|&(name, id, kind, _)| {
            InfoElement::new(name, id, kind, IANA_ENTERPRISE_ID)
        })
    }

    fn reverse(&self, name: &str) -> Option<InfoElement> {
        let forward = forward(name)?;
        let &(_, id, kind, reversible) = IANA.iter().find(|e| e.0 == forward)?;
        match reversible {
            true  => Some(InfoElement::new(name, id, kind, REVERSE_ENTERPRISE_ID)),
            false => None,
        }
    }

    fn antrea(&self, name: &str) -> Option<InfoElement> {
        ANTREA.iter().find(|e| e.0 == name).map(|&(name, id, kind)| {
            InfoElement::new(name, id, kind, ANTREA_ENTERPRISE_ID)
        })
    }
}

impl Registry for Elements {
    fn element(&self, name: &str, enterprise: u32) -> Result<InfoElement, Error> {
        let element = match enterprise {
            IANA_ENTERPRISE_ID    => self.iana(name),
            REVERSE_ENTERPRISE_ID => self.reverse(name),
            ANTREA_ENTERPRISE_ID  => self.antrea(name),
            _                     => None,
        };

        element.ok_or_else(|| Error::Unknown {
            name:       name.to_owned(),
            enterprise: enterprise,
        })
    }
}

// reversePacketTotalCount -> packetTotalCount
fn forward(name: &str) -> Option<String> {
    let rest  = name.strip_prefix("reverse")?;
    let mut cs = rest.chars();
    let first = cs.next()?;
    match first.is_ascii_uppercase() {
        true  => Some(first.to_ascii_lowercase().to_string() + cs.as_str()),
        false => None,
    }
}
