use std::io;
use crate::element::DataType;
use crate::record::SetKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown element '{name}' for enterprise {enterprise}")]
    Unknown { name: String, enterprise: u32 },

    #[error("element '{name}' expects {kind:?} but got {value}")]
    Type { name: String, kind: DataType, value: &'static str },

    #[error("element '{name}' value length {length} exceeds limit")]
    Length { name: String, length: usize },

    #[error("invalid template id {0}, must be >= 256")]
    TemplateId(u16),

    #[error("template {0} has no elements")]
    EmptyTemplate(u16),

    #[error("{record:?} record sent as {kind:?}")]
    Kind { kind: SetKind, record: SetKind },

    #[error("timestamp {0} out of range for dateTimeSeconds")]
    Timestamp(i64),

    #[error("message length {0} exceeds 65535")]
    TooLarge(usize),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
