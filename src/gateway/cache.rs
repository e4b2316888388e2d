//! Scoped list cache with explicit invalidation.
//!
//! DESIGN
//! ======
//! Lists are cached per [`QueryKey`] scope. Writers invalidate the scopes
//! they touch; every invalidation bumps a generation counter. A reader
//! records the generation before it queries the store and only caches the
//! result if no invalidation happened in between, so a list that raced a
//! write is never cached stale.
//!
//! Values are type-erased (`Arc<dyn Any>`) because one cache holds lists of
//! every entity kind; each key maps to exactly one record type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::Id;

/// Scope of one cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users,
    Projects,
    Members(Id),
    Milestones(Id),
    Tasks { project_id: Id, milestone_id: Option<Id> },
    Folders { project_id: Id, parent_id: Option<Id> },
    Files { project_id: Id, folder_id: Option<Id> },
    FileVersions(Id),
    FileActivities(Id),
    TaskComments(Id),
    FileComments(Id),
}

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, Entry>,
    generation: u64,
}

/// Shared handle; clones see the same entries. A disabled cache never
/// stores anything.
#[derive(Clone)]
pub struct QueryCache {
    inner: Option<Arc<Mutex<CacheInner>>>,
}

impl QueryCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { inner: enabled.then(|| Arc::new(Mutex::new(CacheInner::default()))) }
    }

    fn with<R>(&self, f: impl FnOnce(&mut CacheInner) -> R) -> Option<R> {
        let inner = self.inner.as_ref()?;
        let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.with(|c| c.generation).unwrap_or(0)
    }

    #[must_use]
    pub fn get<T>(&self, key: &QueryKey) -> Option<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.with(|c| c.entries.get(key).cloned())
            .flatten()
            .and_then(|entry| entry.downcast_ref::<Vec<T>>().cloned())
    }

    /// Store `rows` under `key` unless an invalidation happened after
    /// `generation` was read. Returns whether the rows were cached.
    pub fn put_if_current<T>(&self, key: QueryKey, generation: u64, rows: Vec<T>) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.with(|c| {
            if c.generation != generation {
                return false;
            }
            c.entries.insert(key, Arc::new(rows));
            true
        })
        .unwrap_or(false)
    }

    pub fn invalidate(&self, keys: &[QueryKey]) {
        self.with(|c| {
            c.generation += 1;
            for key in keys {
                c.entries.remove(key);
            }
        });
    }

    /// Drop every entry whose key satisfies `stale`.
    pub fn invalidate_where(&self, stale: impl Fn(&QueryKey) -> bool) {
        self.with(|c| {
            c.generation += 1;
            c.entries.retain(|key, _| !stale(key));
        });
    }

    pub fn clear(&self) {
        self.with(|c| {
            c.generation += 1;
            c.entries.clear();
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with(|c| c.entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
