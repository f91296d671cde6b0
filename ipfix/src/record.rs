use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr};
use crate::element::{DataType, InfoElement};
use crate::Error;

const MAX_STRING: usize = 65535;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SetKind {
    Template,
    Data,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Unsigned8(u8),
    Unsigned16(u16),
    Unsigned32(u32),
    Unsigned64(u64),
    DateTimeSeconds(i64),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    String(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Template(Template),
    Data(Data),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    pub id:       u16,
    pub elements: Vec<InfoElement>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Data {
    pub id:     u16,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub element: InfoElement,
    pub value:   Value,
}

/// Builds the field specifiers of a single template record.
pub struct TemplateRecord {
    id:       u16,
    elements: Vec<InfoElement>,
}

/// Builds the values of a single data record, in template order.
pub struct DataRecord {
    id:     u16,
    fields: Vec<Field>,
}

impl Value {
    pub fn name(&self) -> &'static str {
        match self {
            Value::Unsigned8(..)       => "unsigned8",
            Value::Unsigned16(..)      => "unsigned16",
            Value::Unsigned32(..)      => "unsigned32",
            Value::Unsigned64(..)      => "unsigned64",
            Value::DateTimeSeconds(..) => "dateTimeSeconds",
            Value::Ipv4(..)            => "ipv4Address",
            Value::Ipv6(..)            => "ipv6Address",
            Value::String(..)          => "string",
        }
    }

    fn matches(&self, kind: DataType) -> bool {
        match (self, kind) {
            (Value::Unsigned8(..),       DataType::Unsigned8)       => true,
            (Value::Unsigned16(..),      DataType::Unsigned16)      => true,
            (Value::Unsigned32(..),      DataType::Unsigned32)      => true,
            (Value::Unsigned64(..),      DataType::Unsigned64)      => true,
            (Value::DateTimeSeconds(..), DataType::DateTimeSeconds) => true,
            (Value::Ipv4(..),            DataType::Ipv4Address)     => true,
            (Value::Ipv6(..),            DataType::Ipv6Address)     => true,
            (Value::String(..),          DataType::String)          => true,
            _                                                       => false,
        }
    }

    /// Encoded size including any variable-length prefix.
    pub fn length(&self) -> usize {
        match self {
            Value::String(s) if s.len() < 255 => 1 + s.len(),
            Value::String(s)                  => 3 + s.len(),
            Value::Unsigned8(..)              => 1,
            Value::Unsigned16(..)             => 2,
            Value::Unsigned32(..)             => 4,
            Value::Unsigned64(..)             => 8,
            Value::DateTimeSeconds(..)        => 4,
            Value::Ipv4(..)                   => 4,
            Value::Ipv6(..)                   => 16,
        }
    }
}

impl Record {
    pub fn kind(&self) -> SetKind {
        match self {
            Record::Template(..) => SetKind::Template,
            Record::Data(..)     => SetKind::Data,
        }
    }

    pub fn id(&self) -> u16 {
        match self {
            Record::Template(t) => t.id,
            Record::Data(d)     => d.id,
        }
    }
}

impl TemplateRecord {
    pub fn new(id: u16) -> Self {
        Self {
            id:       id,
            elements: Vec::new(),
        }
    }

    pub fn add(&mut self, element: InfoElement) -> Result<usize, Error> {
        if self.elements.len() == u16::MAX as usize {
            return Err(Error::TooLarge(self.elements.len()));
        }

        let bytes = match element.is_enterprise() {
            true  => 8,
            false => 4,
        };

        self.elements.push(element);

        Ok(bytes)
    }

    pub fn elements(&self) -> &[InfoElement] {
        &self.elements
    }

    pub fn finish(&mut self) -> Record {
        Record::Template(Template {
            id:       self.id,
            elements: mem::take(&mut self.elements),
        })
    }
}

impl DataRecord {
    pub fn new(id: u16) -> Self {
        Self {
            id:     id,
            fields: Vec::new(),
        }
    }

    pub fn add(&mut self, element: &InfoElement, value: Value) -> Result<usize, Error> {
        if !value.matches(element.kind) {
            return Err(Error::Type {
                name:  element.name.clone(),
                kind:  element.kind,
                value: value.name(),
            });
        }

        if let Value::String(s) = &value {
            if s.len() > MAX_STRING {
                return Err(Error::Length {
                    name:   element.name.clone(),
                    length: s.len(),
                });
            }
        }

        let bytes = value.length();

        self.fields.push(Field {
            element: element.clone(),
            value:   value,
        });

        Ok(bytes)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn finish(&mut self) -> Record {
        Record::Data(Data {
            id:     self.id,
            fields: mem::take(&mut self.fields),
        })
    }
}
