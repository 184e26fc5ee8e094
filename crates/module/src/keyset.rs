//! Static state-key sets declared by actions.
//!
//! The host runtime schedules disjoint transactions in parallel from these
//! declarations, so the set must name every key an action may read or write
//! and must be a function of the action's fields only.

use std::collections::BTreeMap;

/// Access level an action declares for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
    ReadWrite,
    /// Read, write, and allocate (create or delete the row).
    All,
}

impl Permission {
    pub fn allows_write(&self) -> bool {
        !matches!(self, Permission::Read)
    }
}

/// Deterministically ordered key → permission map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeMap<Vec<u8>, Permission>);

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: Vec<u8>, perm: Permission) -> Self {
        self.insert(key, perm);
        self
    }

    pub fn insert(&mut self, key: Vec<u8>, perm: Permission) {
        self.0.insert(key, perm);
    }

    pub fn permission(&self, key: &[u8]) -> Option<Permission> {
        self.0.get(key).copied()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Permission)> {
        self.0.iter()
    }

    /// True when any key appears in both sets with at least one writer —
    /// the condition that forces serialization.
    pub fn conflicts_with(&self, other: &KeySet) -> bool {
        self.0.iter().any(|(key, perm)| {
            other
                .permission(key)
                .is_some_and(|theirs| perm.allows_write() || theirs.allows_write())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_requires_a_writer() {
        let read_only = KeySet::new().with(b"k".to_vec(), Permission::Read);
        let reader = KeySet::new().with(b"k".to_vec(), Permission::Read);
        let writer = KeySet::new().with(b"k".to_vec(), Permission::Write);
        let disjoint = KeySet::new().with(b"other".to_vec(), Permission::All);

        assert!(!read_only.conflicts_with(&reader));
        assert!(read_only.conflicts_with(&writer));
        assert!(writer.conflicts_with(&read_only));
        assert!(!writer.conflicts_with(&disjoint));
    }
}
