//! Configuration types for Loam components.
//!
//! TODO(config): Make HTTP values environment-configurable
//! Currently the defaults are hardcoded. Should support:
//! - `HTTP_TIMEOUT` for API request timeout
//! - `HTTP_MAX_RETRIES` for retry attempts

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SeedError;
use crate::record::{CollectionBinding, RelationBinding};

/// HTTP client configuration for content API calls.
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// The set of collection bindings a run can target.
///
/// The built-in catalog covers the collections our seed datasets ship with;
/// a TOML bindings file can replace or extend it without recompiling.
#[derive(Debug, Clone)]
pub struct BindingsCatalog {
    bindings: Vec<CollectionBinding>,
}

impl BindingsCatalog {
    /// Bindings for the built-in content collections.
    pub fn builtin() -> Self {
        let industries = CollectionBinding::new("industries", "Industry", "industries", "slug");

        let technologies =
            CollectionBinding::new("technologies", "Technology", "technologies", "slug")
                .with_relation(RelationBinding {
                    field: "industries".to_string(),
                    target_query_field: "industries".to_string(),
                    target_key_field: "slug".to_string(),
                    to_many: true,
                });

        let components = CollectionBinding::new("components", "Component", "components", "slug")
            .with_relation(RelationBinding {
                field: "technologies".to_string(),
                target_query_field: "technologies".to_string(),
                target_key_field: "slug".to_string(),
                to_many: true,
            });

        // Applications key on their title; the API has no slug for them.
        let applications =
            CollectionBinding::new("applications", "Application", "applications", "title")
                .with_relation(RelationBinding {
                    field: "industry".to_string(),
                    target_query_field: "industries".to_string(),
                    target_key_field: "slug".to_string(),
                    to_many: false,
                })
                .with_relation(RelationBinding {
                    field: "components".to_string(),
                    target_query_field: "components".to_string(),
                    target_key_field: "slug".to_string(),
                    to_many: true,
                })
                .with_relation(RelationBinding {
                    field: "technologies".to_string(),
                    target_query_field: "technologies".to_string(),
                    target_key_field: "slug".to_string(),
                    to_many: true,
                });

        Self {
            bindings: vec![industries, technologies, components, applications],
        }
    }

    /// Looks up a binding by its catalog name.
    pub fn get(&self, name: &str) -> Option<&CollectionBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Catalog names, for listing and error messages.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name.as_str()).collect()
    }

    /// Adds a binding, replacing any existing binding with the same name.
    pub fn insert(&mut self, binding: CollectionBinding) {
        if let Some(existing) = self.bindings.iter_mut().find(|b| b.name == binding.name) {
            *existing = binding;
        } else {
            self.bindings.push(binding);
        }
    }
}

/// On-disk shape of a bindings file.
#[derive(Debug, Deserialize)]
struct BindingsFile {
    #[serde(default)]
    collections: Vec<CollectionBinding>,
}

/// Returns the default bindings file path under the user config directory.
pub fn default_bindings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("loam").join("bindings.toml"))
}

/// Loads the collection catalog, merging an optional TOML bindings file over
/// the built-in bindings.
///
/// An explicit `path` must exist. Without one, the default path is used only
/// if a file is present there.
pub fn load_bindings(path: Option<&Path>) -> Result<BindingsCatalog, SeedError> {
    let mut catalog = BindingsCatalog::builtin();

    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_bindings_path().filter(|p| p.exists()),
    };

    if let Some(path) = path {
        let raw = fs::read_to_string(&path)?;
        let file: BindingsFile = toml::from_str(&raw)
            .map_err(|e| SeedError::Bindings(format!("{}: {}", path.display(), e)))?;

        for binding in file.collections {
            validate_binding(&binding)?;
            catalog.insert(binding);
        }
    }

    Ok(catalog)
}

fn validate_binding(binding: &CollectionBinding) -> Result<(), SeedError> {
    if binding.name.trim().is_empty() {
        return Err(SeedError::Bindings("collection has a blank name".to_string()));
    }
    if !binding
        .type_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
    {
        return Err(SeedError::Bindings(format!(
            "collection '{}': type_name '{}' must be a capitalized GraphQL type name",
            binding.name, binding.type_name
        )));
    }
    if binding.query_field.trim().is_empty() || binding.key_field.trim().is_empty() {
        return Err(SeedError::Bindings(format!(
            "collection '{}' must set query_field and key_field",
            binding.name
        )));
    }
    for relation in &binding.relations {
        if relation.field.trim().is_empty()
            || relation.target_query_field.trim().is_empty()
            || relation.target_key_field.trim().is_empty()
        {
            return Err(SeedError::Bindings(format!(
                "collection '{}': relation bindings must set field, target_query_field and target_key_field",
                binding.name
            )));
        }
    }
    Ok(())
}
