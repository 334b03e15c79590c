use crate::validate::validate_entity_name;
use crate::{CatalogEntity, CatalogKind, CatalogRepository, Clock, CoreError};

/// Application service behind the brand and type endpoints.
///
/// Generic over repository and clock so the domain stays testable without
/// external dependencies. Holds no mutable state of its own.
pub struct CatalogService<R: CatalogRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: CatalogRepository, C: Clock> CatalogService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Create a new brand or type from a raw request name.
    pub fn create(
        &self,
        kind: CatalogKind,
        name: Option<&str>,
    ) -> Result<CatalogEntity, CoreError> {
        let name = validate_entity_name(name)?;
        self.repo.create(kind, &name, self.clock.now())
    }

    /// List every row of the given kind.
    pub fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, CoreError> {
        self.repo.find_all(kind)
    }
}
