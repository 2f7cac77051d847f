// Bidirectional lookup table.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// One-to-one mapping that resolves in both directions.
///
/// Inserting a pair evicts any existing pair sharing either side, so the
/// forward and reverse tables always agree. Interior locking lets a shared
/// instance be read concurrently and refreshed in place.
#[derive(Debug)]
pub struct BiMap<L, R> {
    inner: RwLock<Tables<L, R>>,
}

#[derive(Debug)]
struct Tables<L, R> {
    forward: HashMap<L, R>,
    reverse: HashMap<R, L>,
}

impl<L, R> Default for BiMap<L, R> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Tables {
                forward: HashMap::new(),
                reverse: HashMap::new(),
            }),
        }
    }
}

impl<L, R> BiMap<L, R>
where
    L: Eq + Hash + Clone,
    R: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, left: L, right: R) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(old_right) = tables.forward.remove(&left) {
            tables.reverse.remove(&old_right);
        }
        if let Some(old_left) = tables.reverse.remove(&right) {
            tables.forward.remove(&old_left);
        }
        tables.forward.insert(left.clone(), right.clone());
        tables.reverse.insert(right, left);
    }

    pub fn get_by_left<Q>(&self, left: &Q) -> Option<R>
    where
        L: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.forward.get(left).cloned()
    }

    pub fn get_by_right<Q>(&self, right: &Q) -> Option<L>
    where
        R: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.reverse.get(right).cloned()
    }

    pub fn remove_by_left<Q>(&self, left: &Q) -> Option<R>
    where
        L: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let right = tables.forward.remove(left)?;
        tables.reverse.remove(&right);
        Some(right)
    }

    /// Replace the whole table atomically.
    pub fn replace_all(&self, pairs: impl IntoIterator<Item = (L, R)>) {
        let fresh: Self = pairs.into_iter().collect();
        let fresh = fresh.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *tables = fresh;
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .forward
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L, R> FromIterator<(L, R)> for BiMap<L, R>
where
    L: Eq + Hash + Clone,
    R: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (L, R)>>(iter: I) -> Self {
        let map = Self::new();
        for (l, r) in iter {
            map.insert(l, r);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_directions() {
        let map: BiMap<String, String> = [
            ("web".to_owned(), "uuid-1".to_owned()),
            ("mail".to_owned(), "uuid-2".to_owned()),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.get_by_left("web").as_deref(), Some("uuid-1"));
        assert_eq!(map.get_by_right("uuid-2").as_deref(), Some("mail"));
        assert_eq!(map.get_by_left("dns"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn reinsert_evicts_stale_pairs() {
        let map = BiMap::new();
        map.insert("web", 1);
        map.insert("web", 2);
        assert_eq!(map.get_by_right(&1), None);
        assert_eq!(map.get_by_left("web"), Some(2));

        map.insert("www", 2);
        assert_eq!(map.get_by_left("web"), None);
        assert_eq!(map.get_by_right(&2), Some("www"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn replace_all_drops_previous_entries() {
        let map = BiMap::new();
        map.insert("old", 1);
        map.replace_all([("new", 2)]);
        assert!(map.get_by_left("old").is_none());
        assert_eq!(map.get_by_right(&2), Some("new"));
        assert_eq!(map.remove_by_left("new"), Some(2));
        assert!(map.is_empty());
    }
}
