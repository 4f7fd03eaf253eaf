use std::collections::{HashMap, VecDeque};

use crate::packet::PacketRecord;

/// How many records a single port's sequence may hold before the oldest
/// ones are evicted.
const MAX_RECORDS_PER_PORT: usize = 10_000;

/// Per-port append-only packet history, used for UI replay.
///
/// A port's sequence is created lazily on its first packet and is ordered
/// by arrival. Sequences of different ports are independent. Each sequence
/// is bounded; once full, appending evicts the oldest record.
/// Reads hand out owned copies so a reader never holds a reference across
/// a later append.
#[derive(Debug, Default)]
pub struct PacketLog {
    records: HashMap<String, VecDeque<PacketRecord>>,
}

impl PacketLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the given port's sequence, creating it if absent.
    pub fn record(&mut self, port_name: &str, record: PacketRecord) {
        let records = self.records.entry(port_name.to_string()).or_default();

        if records.len() == MAX_RECORDS_PER_PORT {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// An owned copy of the given port's sequence, oldest first.
    /// Empty if the port has no packets yet.
    pub fn for_port(&self, port_name: &str) -> Vec<PacketRecord> {
        self.records
            .get(port_name)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// How many packets are filed under the given port.
    pub fn len(&self, port_name: &str) -> usize {
        self.records.get(port_name).map(VecDeque::len).unwrap_or(0)
    }

    /// Whether nothing has been recorded at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of ports with at least one record, sorted.
    pub fn ports(&self) -> Vec<String> {
        let mut names = self.records.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}
