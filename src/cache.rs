/// Anything stored under an opaque record id.
pub trait Record {
    fn record_id(&self) -> &str;
}

/// Local copy of remote records, mutated optimistically after each write.
///
/// Conflict policy: a refetch replaces the whole cache (last write wins).
/// Optimistic entries never survive a refetch that does not contain them.
#[derive(Clone, Debug)]
pub struct RecordCache<T> {
    records: Vec<T>,
    synced: bool,
}

impl<T> Default for RecordCache<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            synced: false,
        }
    }
}

impl<T: Record> RecordCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cache has been filled from the store at least once.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn replace_all(&mut self, fresh: Vec<T>) {
        self.records = fresh;
        self.synced = true;
    }

    /// Replaces the record with the same id in place, or appends it.
    pub fn upsert(&mut self, record: T) {
        match self
            .records
            .iter_mut()
            .find(|r| r.record_id() == record.record_id())
        {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.records.iter().position(|r| r.record_id() == id)?;
        Some(self.records.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.record_id() == id)
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.records.iter().find(|r| pred(r))
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
