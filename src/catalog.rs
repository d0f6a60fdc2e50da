use std::collections::HashSet;

use crate::model::{Resource, ResourceId};

/// The fixed set of bookable resources, in display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: Vec<Resource>,
}

impl Default for Catalog {
    fn default() -> Self {
        let resources = [(1, "Pool 1"), (2, "Pool 2"), (3, "Pool 3"), (4, "Shuffleboard 1")]
            .into_iter()
            .map(|(id, name)| Resource {
                id,
                name: name.to_string(),
            })
            .collect();
        Self { resources }
    }
}

impl Catalog {
    /// Build a catalog from an explicit list. Returns the first duplicated id on failure.
    pub fn new(resources: Vec<Resource>) -> Result<Self, ResourceId> {
        let mut seen = HashSet::new();
        for r in &resources {
            if !seen.insert(r.id) {
                return Err(r.id);
            }
        }
        Ok(Self { resources })
    }

    pub fn exists(&self, id: ResourceId) -> bool {
        self.resources.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn list(&self) -> &[Resource] {
        &self.resources
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_matches_deployment() {
        let catalog = Catalog::default();
        let names: Vec<_> = catalog.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pool 1", "Pool 2", "Pool 3", "Shuffleboard 1"]);
        assert!(catalog.exists(4));
        assert!(!catalog.exists(5));
        assert_eq!(catalog.get(2).map(|r| r.name.as_str()), Some("Pool 2"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let resources = vec![
            Resource { id: 1, name: "A".into() },
            Resource { id: 1, name: "B".into() },
        ];
        assert_eq!(Catalog::new(resources).unwrap_err(), 1);
    }

    #[test]
    fn custom_catalog_keeps_order() {
        let resources = vec![
            Resource { id: 9, name: "Court".into() },
            Resource { id: 3, name: "Lane".into() },
        ];
        let catalog = Catalog::new(resources).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec![9, 3]);
    }
}
