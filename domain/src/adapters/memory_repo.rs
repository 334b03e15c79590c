use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::{CatalogEntity, CatalogKind, CatalogRepository, CoreError, EntityName};

/// One table: rows in insertion order plus its id counter.
#[derive(Default)]
struct Table {
    last_id: u64,
    rows: Vec<CatalogEntity>,
}

/// Simple in-memory repository for tests and ephemeral runs. Each kind gets its
/// own table; the mutex makes id assignment and the uniqueness check atomic.
pub struct InMemoryRepo {
    inner: Mutex<BTreeMap<CatalogKind, Table>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogRepository for InMemoryRepo {
    fn create(
        &self,
        kind: CatalogKind,
        name: &EntityName,
        at: SystemTime,
    ) -> Result<CatalogEntity, CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let table = map.entry(kind).or_default();
        if table.rows.iter().any(|row| &row.name == name) {
            return Err(CoreError::AlreadyExists);
        }
        table.last_id += 1;
        let entity = CatalogEntity::new(table.last_id, name.clone(), at);
        table.rows.push(entity.clone());
        Ok(entity)
    }

    fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.get(&kind).map(|t| t.rows.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[test]
    fn create_then_find_all_in_id_order() {
        let repo = InMemoryRepo::new();
        let at = SystemTime::UNIX_EPOCH;
        for n in ["Nike", "Adidas", "Puma"] {
            repo.create(CatalogKind::Brand, &name(n), at).unwrap();
        }
        let rows = repo.find_all(CatalogKind::Brand).unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[0].name.as_str(), "Nike");
        assert_eq!(rows[2].name.as_str(), "Puma");
    }

    #[test]
    fn find_all_on_unknown_table_is_empty() {
        let repo = InMemoryRepo::new();
        assert!(repo.find_all(CatalogKind::Type).unwrap().is_empty());
    }

    #[test]
    fn duplicate_does_not_consume_an_id() {
        let repo = InMemoryRepo::new();
        let at = SystemTime::UNIX_EPOCH;
        repo.create(CatalogKind::Type, &name("Phones"), at).unwrap();
        let err = repo.create(CatalogKind::Type, &name("Phones"), at).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
        let next = repo.create(CatalogKind::Type, &name("Tablets"), at).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn names_are_case_sensitive() {
        let repo = InMemoryRepo::new();
        let at = SystemTime::UNIX_EPOCH;
        repo.create(CatalogKind::Brand, &name("nike"), at).unwrap();
        assert!(repo.create(CatalogKind::Brand, &name("Nike"), at).is_ok());
    }

    #[test]
    fn concurrent_creates_get_unique_ids() {
        let repo = Arc::new(InMemoryRepo::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for i in 0..25 {
                        repo.create(
                            CatalogKind::Brand,
                            &name(&format!("brand-{t}-{i}")),
                            SystemTime::UNIX_EPOCH,
                        )
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let rows = repo.find_all(CatalogKind::Brand).unwrap();
        assert_eq!(rows.len(), 200);
        let ids: BTreeSet<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.iter().next_back(), Some(&200));
    }
}
