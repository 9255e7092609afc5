use crate::records::record::Record;

/// Upper bound on the records reserved up front; larger chunks grow as they fill.
const MAX_PREALLOCATED: usize = 1024;

/// Ordered, bounded group of records committed as one unit.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    records: Vec<Record>,
    capacity: usize,
    /// Physical records consumed while filling the chunk but skipped by policy.
    skipped: u64,
}

impl Chunk {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity.min(MAX_PREALLOCATED)),
            capacity: capacity.max(1),
            skipped: 0,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn mark_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Physical records this chunk accounts for: committed plus skipped.
    pub fn consumed(&self) -> u64 {
        self.records.len() as u64 + self.skipped
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn size_bytes(&self) -> usize {
        self.records.iter().map(|r| r.size_bytes()).sum()
    }
}
