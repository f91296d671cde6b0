pub mod args;
pub mod exporter;
pub mod flows;
