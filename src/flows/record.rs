use super::Connection;

/// A connection paired with the counters of its last successful export.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowRecord {
    pub conn:                 Connection,
    pub prev_packets:         u64,
    pub prev_bytes:           u64,
    pub prev_reverse_packets: u64,
    pub prev_reverse_bytes:   u64,
    pub active:               bool,
}

impl FlowRecord {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn:                 conn,
            prev_packets:         0,
            prev_bytes:           0,
            prev_reverse_packets: 0,
            prev_reverse_bytes:   0,
            active:               true,
        }
    }

    /// Move the baselines up to the current absolute counters. Only valid
    /// once a data record carrying those counters has been sent.
    pub fn advance(&mut self) {
        self.prev_packets         = self.conn.original_packets;
        self.prev_bytes           = self.conn.original_bytes;
        self.prev_reverse_packets = self.conn.reverse_packets;
        self.prev_reverse_bytes   = self.conn.reverse_bytes;
    }

    pub fn pending(&self) -> bool {
        self.prev_packets         != self.conn.original_packets ||
        self.prev_bytes           != self.conn.original_bytes   ||
        self.prev_reverse_packets != self.conn.reverse_packets  ||
        self.prev_reverse_bytes   != self.conn.reverse_bytes
    }
}
