use std::fmt;

pub const IANA_ENTERPRISE_ID:    u32 = 0;
pub const REVERSE_ENTERPRISE_ID: u32 = 29305;
pub const ANTREA_ENTERPRISE_ID:  u32 = 56506;

pub const VARIABLE_LENGTH: u16 = 65535;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    String,
    DateTimeSeconds,
    Ipv4Address,
    Ipv6Address,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InfoElement {
    pub name:       String,
    pub id:         u16,
    pub kind:       DataType,
    pub enterprise: u32,
    pub length:     u16,
}

impl DataType {
    /// Abstract data type code from the IANA IPFIX registry.
    pub fn code(&self) -> u8 {
        match self {
            DataType::Unsigned8       => 1,
            DataType::Unsigned16      => 2,
            DataType::Unsigned32      => 3,
            DataType::Unsigned64      => 4,
            DataType::String          => 13,
            DataType::DateTimeSeconds => 14,
            DataType::Ipv4Address     => 18,
            DataType::Ipv6Address     => 19,
        }
    }

    pub fn length(&self) -> u16 {
        match self {
            DataType::Unsigned8       => 1,
            DataType::Unsigned16      => 2,
            DataType::Unsigned32      => 4,
            DataType::Unsigned64      => 8,
            DataType::String          => VARIABLE_LENGTH,
            DataType::DateTimeSeconds => 4,
            DataType::Ipv4Address     => 4,
            DataType::Ipv6Address     => 16,
        }
    }
}

impl InfoElement {
    pub fn new(name: &str, id: u16, kind: DataType, enterprise: u32) -> Self {
        Self {
            name:       name.to_owned(),
            id:         id,
            kind:       kind,
            enterprise: enterprise,
            length:     kind.length(),
        }
    }

    pub fn is_enterprise(&self) -> bool {
        self.enterprise != IANA_ENTERPRISE_ID
    }
}

impl fmt::Display for InfoElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}/{})", self.name, self.enterprise, self.id)
    }
}
