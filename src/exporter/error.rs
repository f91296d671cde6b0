use std::net::IpAddr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to resolve element '{name}' ({enterprise}): {source}")]
    Resolution { name: String, enterprise: u32, source: ipfix::Error },

    #[error("transport failed: {0}")]
    Transport(#[source] ipfix::Error),

    #[error("no extraction rule for element '{0}'")]
    Consistency(String),

    #[error("failed to add element: {0}")]
    Record(#[source] ipfix::Error),

    #[error("address {addr} does not fit element '{name}'")]
    Address { name: &'static str, addr: IpAddr },

    #[error("no template has been sent")]
    NoTemplate,

    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure concerns the collector or exporter rather than
    /// the single record being built.
    pub fn aborts_cycle(&self) -> bool {
        match self {
            Error::Transport(ipfix::Error::Io(..)) => true,
            Error::NoTemplate                      => true,
            _                                      => false,
        }
    }
}
