use std::io;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use log::{debug, trace, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio::runtime::{Builder, Runtime};
use crate::message::Message;
use crate::record::{Record, SetKind};
use crate::Error;

/// Delivers finished records to a collector.
pub trait Transport {
    fn send(&mut self, kind: SetKind, record: Record) -> Result<usize, Error>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// IPFIX exporting process bound to a single collector.
pub struct Process {
    rt:      Runtime,
    sock:    Socket,
    message: Message,
}

enum Socket {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Process {
    pub fn connect(addr: &str, protocol: Protocol, domain: u32) -> Result<Self, Error> {
        let rt   = Builder::new_current_thread().enable_io().build()?;
        let sock = rt.block_on(connect(addr, protocol))?;

        debug!("connected to collector {} ({:?})", addr, protocol);

        Ok(Self {
            rt:      rt,
            sock:    sock,
            message: Message::new(domain),
        })
    }

    pub fn sequence(&self) -> u32 {
        self.message.sequence()
    }

    pub fn close(self) {
        debug!("closing exporting process");
        if let Socket::Tcp(mut sock) = self.sock {
            if let Err(e) = self.rt.block_on(sock.shutdown()) {
                warn!("collector shutdown failed: {}", e);
            }
        }
    }
}

impl Transport for Process {
    fn send(&mut self, kind: SetKind, record: Record) -> Result<usize, Error> {
        if record.kind() != kind {
            return Err(Error::Kind { kind, record: record.kind() });
        }

        let (msg, records) = self.message.encode(&record, now())?;
        trace!("sending {:?} message, {} bytes", kind, msg.len());

        let sock = &mut self.sock;
        let sent = self.rt.block_on(async {
            match sock {
                Socket::Tcp(s) => s.write_all(&msg).await.map(|_| msg.len()),
                Socket::Udp(s) => s.send(&msg).await,
            }
        })?;

        self.message.commit(records);

        Ok(sent)
    }
}

async fn connect(addr: &str, protocol: Protocol) -> Result<Socket, Error> {
    Ok(match protocol {
        Protocol::Tcp => Socket::Tcp(TcpStream::connect(addr).await?),
        Protocol::Udp => {
            let peer = lookup_host(addr).await?.next().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", addr))
            })?;
            let local = match peer {
                SocketAddr::V4(..) => "0.0.0.0:0",
                SocketAddr::V6(..) => "[::]:0",
            };
            let sock = UdpSocket::bind(local).await?;
            sock.connect(peer).await?;
            Socket::Udp(sock)
        }
    })
}

fn now() -> u32 {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs());
    secs.unwrap_or(0) as u32
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _     => Err(format!("invalid protocol: {}", s)),
        }
    }
}
