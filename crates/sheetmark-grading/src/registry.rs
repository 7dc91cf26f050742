//! Project registry

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::rubric::{catalog, RubricTask};

/// A numbered exercise and its ordered rubric
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Project id (e.g. "P09")
    pub id: String,
    /// Display name
    pub name: String,
    /// Tasks in rubric order
    pub tasks: Vec<RubricTask>,
}

impl Project {
    /// Create a project
    pub fn new(id: impl Into<String>, name: impl Into<String>, tasks: Vec<RubricTask>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks,
        }
    }

    /// Points available over all tasks
    pub fn max_score(&self) -> Decimal {
        self.tasks.iter().map(|t| t.max_score).sum()
    }
}

/// Projects by id, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    projects: BTreeMap<String, Project>,
}

impl Registry {
    /// Registry without any project
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in projects
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(catalog::p09());
        registry
    }

    /// Add a project, returning the one it replaces
    pub fn register(&mut self, project: Project) -> Option<Project> {
        self.projects.insert(project.id.clone(), project)
    }

    /// Look up a project by id
    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    /// All projects in id order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Check for an empty registry
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_p09() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("P09").map(|p| p.name.as_str()),
            Some("Sales and Orders Report")
        );
        assert!(registry.get("P10").is_none());
    }

    #[test]
    fn test_register_keeps_id_order() {
        let mut registry = Registry::builtin();
        assert!(registry.register(Project::new("P01", "Intro", Vec::new())).is_none());
        assert!(registry.register(Project::new("P12", "Budget", Vec::new())).is_none());

        let ids: Vec<_> = registry.projects().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["P01", "P09", "P12"]);

        let replaced = registry.register(Project::new("P01", "Intro v2", Vec::new()));
        assert_eq!(replaced.map(|p| p.name), Some("Intro".to_string()));
        assert_eq!(registry.len(), 3);
    }
}
