use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use orders_types::ports::kv_store::{BatchOp, KvStore, ScanPage, StoreError};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::kv::KvOrderRepo;

pub type InMemoryRepo = KvOrderRepo<InMemoryStore>;

/// Process-local [`KvStore`].
///
/// Set members are kept ordered by a stable hash slot so a scan cursor is
/// simply the next slot to visit, which keeps scans complete while the set
/// changes underneath them.
#[derive(Default)]
pub struct InMemoryStore {
    values: DashMap<String, Vec<u8>>,
    sets: DashMap<String, BTreeSet<(u64, String)>>,
    // Batches hold it exclusively so no reader sees half of one.
    gate: RwLock<()>,
}

fn slot(member: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    member.hash(&mut hasher);
    // 0 is reserved for "start of scan" / "scan finished".
    hasher.finish().max(1)
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".into())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn shared(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.gate.read().map_err(|_| poisoned())
    }

    fn exclusive(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.gate.write().map_err(|_| poisoned())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> bool {
        match self.values.entry(key.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(value.to_vec());
                true
            }
        }
    }

    fn put_if_present(&self, key: &str, value: &[u8]) -> bool {
        match self.values.get_mut(key) {
            Some(mut current) => {
                *current = value.to_vec();
                true
            }
            None => false,
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn add_member(&self, set: &str, member: &str) -> bool {
        self.sets
            .entry(set.to_owned())
            .or_default()
            .insert((slot(member), member.to_owned()))
    }

    fn remove_member(&self, set: &str, member: &str) -> bool {
        match self.sets.get_mut(set) {
            Some(mut members) => members.remove(&(slot(member), member.to_owned())),
            None => false,
        }
    }

    fn apply(&self, op: &BatchOp) -> bool {
        match op {
            BatchOp::SetIfAbsent { key, value } => self.put_if_absent(key, value),
            BatchOp::SetIfPresent { key, value } => self.put_if_present(key, value),
            BatchOp::Delete { key } => self.remove(key),
            BatchOp::AddToSet { set, member } => self.add_member(set, member),
            BatchOp::RemoveFromSet { set, member } => self.remove_member(set, member),
        }
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let _gate = self.shared()?;
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let _gate = self.shared()?;
        Ok(self.put_if_absent(key, value))
    }

    async fn set_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let _gate = self.shared()?;
        Ok(self.put_if_present(key, value))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let _gate = self.shared()?;
        Ok(self.remove(key))
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let _gate = self.shared()?;
        Ok(self.add_member(set, member))
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let _gate = self.shared()?;
        Ok(self.remove_member(set, member))
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<ScanPage, StoreError> {
        let _gate = self.shared()?;
        let mut page = ScanPage::default();
        let Some(members) = self.sets.get(set) else {
            return Ok(page);
        };

        // Whole slots only, so resuming at a slot never skips a member.
        let count = count.max(1);
        let mut visited = 0u64;
        let mut last_slot = None;
        for (member_slot, member) in members.range((cursor, String::new())..) {
            if visited >= count && last_slot != Some(*member_slot) {
                page.cursor = *member_slot;
                return Ok(page);
            }
            visited += 1;
            last_slot = Some(*member_slot);
            if glob_match(pattern, member) {
                page.members.push(member.clone());
            }
        }
        Ok(page)
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        let _gate = self.shared()?;
        Ok(keys
            .iter()
            .map(|key| self.values.get(key).map(|v| v.clone()))
            .collect())
    }

    async fn atomic(&self, ops: Vec<BatchOp>) -> Result<Vec<bool>, StoreError> {
        let _gate = self.exclusive()?;
        Ok(ops.iter().map(|op| self.apply(op)).collect())
    }
}

/// Redis-style glob: `*`, `?` and `\` escapes.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        match p.get(pi).copied() {
            Some(b'*') => {
                backtrack = Some((pi, ti));
                pi += 1;
                continue;
            }
            Some(b'?') => {
                pi += 1;
                ti += 1;
                continue;
            }
            Some(b'\\') if p.get(pi + 1) == Some(&t[ti]) => {
                pi += 2;
                ti += 1;
                continue;
            }
            Some(c) if c != b'\\' && c == t[ti] => {
                pi += 1;
                ti += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star, from)) => {
                pi = star + 1;
                ti = from + 1;
                backtrack = Some((star, from + 1));
            }
            None => return false,
        }
    }

    while p.get(pi) == Some(&b'*') {
        pi += 1;
    }
    pi == p.len()
}
