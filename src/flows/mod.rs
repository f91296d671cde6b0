pub use connection::{Connection, Tuple};
pub use record::FlowRecord;
pub use source::Source;
pub use store::FlowRecords;

mod connection;
mod record;
mod source;
mod store;
