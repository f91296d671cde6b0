use std::str::FromStr;
use ipfix::{ANTREA_ENTERPRISE_ID, IANA_ENTERPRISE_ID, REVERSE_ENTERPRISE_ID};
use super::{Error, Rule};

pub const IANA_INFO_ELEMENTS: &[&str] = &[
    "flowStartSeconds",
    "flowEndSeconds",
    "sourceIPv4Address",
    "destinationIPv4Address",
    "sourceTransportPort",
    "destinationTransportPort",
    "protocolIdentifier",
    "packetTotalCount",
    "octetTotalCount",
    "packetDeltaCount",
    "octetDeltaCount",
];

pub const IANA_INFO_ELEMENTS_V6: &[&str] = &[
    "flowStartSeconds",
    "flowEndSeconds",
    "sourceIPv6Address",
    "destinationIPv6Address",
    "sourceTransportPort",
    "destinationTransportPort",
    "protocolIdentifier",
    "packetTotalCount",
    "octetTotalCount",
    "packetDeltaCount",
    "octetDeltaCount",
];

pub const IANA_REVERSE_INFO_ELEMENTS: &[&str] = &[
    "reversePacketTotalCount",
    "reverseOctetTotalCount",
    "reversePacketDeltaCount",
    "reverseOctetDeltaCount",
];

pub const ANTREA_INFO_ELEMENTS: &[&str] = &[
    "sourcePodName",
    "sourcePodNamespace",
    "sourceNodeName",
    "destinationPodName",
    "destinationPodNamespace",
    "destinationNodeName",
    "destinationClusterIP",
    "destinationServicePortName",
];

pub const ANTREA_INFO_ELEMENTS_V6: &[&str] = &[
    "sourcePodName",
    "sourcePodNamespace",
    "sourceNodeName",
    "destinationPodName",
    "destinationPodNamespace",
    "destinationNodeName",
    "destinationClusterIPv6",
    "destinationServicePortName",
];

/// Address family of the exported template.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Family {
    V4,
    V6,
}

#[derive(Copy, Clone, Debug)]
pub struct Group {
    pub names:      &'static [&'static str],
    pub enterprise: u32,
}

/// Element groups in template order: forward, reverse, custom.
pub fn groups(family: Family) -> [Group; 3] {
    let (forward, custom) = match family {
        Family::V4 => (IANA_INFO_ELEMENTS,    ANTREA_INFO_ELEMENTS),
        Family::V6 => (IANA_INFO_ELEMENTS_V6, ANTREA_INFO_ELEMENTS_V6),
    };

    [
        Group { names: forward,                    enterprise: IANA_ENTERPRISE_ID    },
        Group { names: IANA_REVERSE_INFO_ELEMENTS, enterprise: REVERSE_ENTERPRISE_ID },
        Group { names: custom,                     enterprise: ANTREA_ENTERPRISE_ID  },
    ]
}

pub fn names(family: Family) -> impl Iterator<Item = &'static str> {
    let groups = groups(family);
    (0..groups.len()).flat_map(move |i| groups[i].names.iter().copied())
}

pub fn len(family: Family) -> usize {
    groups(family).iter().map(|g| g.names.len()).sum()
}

/// Check that every catalog element has an extraction rule.
pub fn validate(family: Family) -> Result<(), Error> {
    match names(family).find(|name| Rule::lookup(name).is_none()) {
        Some(name) => Err(Error::Consistency(name.to_owned())),
        None       => Ok(()),
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4" | "v4" | "ipv4" => Ok(Family::V4),
            "6" | "v6" | "ipv6" => Ok(Family::V6),
            _                   => Err(format!("invalid address family: {}", s)),
        }
    }
}
