use std::collections::HashMap;
use std::collections::hash_map::Entry;
use log::{debug, trace};
use parking_lot::{Mutex, MutexGuard};
use super::{Connection, FlowRecord, Tuple};

pub struct FlowRecords {
    records: Mutex<HashMap<Tuple, FlowRecord>>,
}

impl FlowRecords {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Merge a full conntrack snapshot. Known connections keep their export
    /// baselines; connections missing from the snapshot are marked inactive
    /// and kept until their final counters are exported.
    pub fn update(&self, conns: Vec<Connection>) {
        let mut records = self.records.lock();

        for r in records.values_mut() {
            r.active = false;
        }

        for conn in conns {
            match records.entry(conn.key()) {
                Entry::Occupied(mut e) => {
                    let r = e.get_mut();
                    r.active = true;
                    r.conn   = conn;
                },
                Entry::Vacant(e) => {
                    trace!("new flow {}", conn.tuple_orig);
                    e.insert(FlowRecord::new(conn));
                }
            }
        }
    }

    pub fn lock(&self) -> MutexGuard<HashMap<Tuple, FlowRecord>> {
        self.records.lock()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn compact(&self) {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.active || r.pending());
        let retired = before - records.len();
        if retired > 0 {
            debug!("retired {} flow records", retired);
        }
    }
}

impl Default for FlowRecords {
    fn default() -> Self {
        Self::new()
    }
}
