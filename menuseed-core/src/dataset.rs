//! The reference catalog and helpers for alternative dataset files.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::DatasetError;
use crate::types::SourceDataset;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

/// A non-fatal problem found by [`SourceDataset::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetWarning {
    UnknownCategory { item: String, category: String },
    UnknownCustomization { item: String, customization: String },
    DuplicateCustomization { name: String },
    DuplicateCategory { name: String },
}

impl fmt::Display for DatasetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetWarning::UnknownCategory { item, category } => {
                write!(f, "menu item '{item}' references unknown category '{category}'")
            }
            DatasetWarning::UnknownCustomization { item, customization } => write!(
                f,
                "menu item '{item}' offers unknown customization '{customization}'"
            ),
            DatasetWarning::DuplicateCustomization { name } => {
                write!(f, "customization '{name}' is declared more than once")
            }
            DatasetWarning::DuplicateCategory { name } => {
                write!(f, "category '{name}' is declared more than once")
            }
        }
    }
}

impl SourceDataset {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, DatasetError> {
        Self::parse("builtin catalog", BUILTIN_CATALOG)
    }

    /// Load a YAML (or JSON) dataset from disk.
    pub fn load_at(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &contents)
    }

    /// Parse a dataset from YAML text.
    pub fn parse(origin: &str, contents: &str) -> Result<Self, DatasetError> {
        serde_yaml::from_str(contents).map_err(|source| DatasetError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Report dangling references and duplicate natural keys.
    ///
    /// Never fails: the seeder decides per item what to do with these.
    pub fn lint(&self) -> Vec<DatasetWarning> {
        let mut warnings = Vec::new();

        let mut categories = HashSet::new();
        for cat in &self.categories {
            if !categories.insert(cat.name.as_str()) {
                warnings.push(DatasetWarning::DuplicateCategory {
                    name: cat.name.clone(),
                });
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for cus in &self.customizations {
            *seen.entry(cus.name.as_str()).or_default() += 1;
        }
        let mut duplicates: Vec<&str> = seen
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(name, _)| *name)
            .collect();
        duplicates.sort_unstable();
        warnings.extend(
            duplicates
                .into_iter()
                .map(|name| DatasetWarning::DuplicateCustomization {
                    name: name.to_string(),
                }),
        );

        for item in &self.menu {
            if !categories.contains(item.category_name.as_str()) {
                warnings.push(DatasetWarning::UnknownCategory {
                    item: item.name.clone(),
                    category: item.category_name.clone(),
                });
            }
            for cus in &item.customizations {
                if !seen.contains_key(cus.as_str()) {
                    warnings.push(DatasetWarning::UnknownCustomization {
                        item: item.name.clone(),
                        customization: cus.clone(),
                    });
                }
            }
        }
        warnings
    }

    /// Total number of menu-item → customization links the dataset declares.
    pub fn link_count(&self) -> usize {
        self.menu.iter().map(|m| m.customizations.len()).sum()
    }
}
