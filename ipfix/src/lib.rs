mod element;
mod error;
mod message;
mod process;
mod record;
mod registry;

pub use element::*;
pub use error::Error;
pub use message::{Message, MIN_TEMPLATE_ID};
pub use process::{Process, Protocol, Transport};
pub use record::{Data, DataRecord, Field, Record, SetKind, Template, TemplateRecord, Value};
pub use registry::{Elements, Registry};
