pub use catalog::{Family, Group};
pub use error::Error;
pub use exporter::{Config, FlowExporter, State};
pub use extract::Rule;

pub mod catalog;

mod error;
mod exporter;
mod extract;

#[cfg(test)]
mod test;
