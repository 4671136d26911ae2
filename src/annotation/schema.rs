//! The class schema: a read-only mapping between class names and the
//! dataset's zero-based class indices.
//!
//! The schema is read from a `data.yaml`-style file whose `names` key is
//! either a sequence (index = position) or a mapping of `index: name`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CurateError;

/// Largest class index accepted in a `names:` mapping. Class ids are `u32`
/// on disk, and gaps below the largest index are filled with placeholders.
pub const MAX_CLASS_INDEX: usize = 65_535;

/// Immutable class-name ↔ class-index mapping.
///
/// Constructed once per run and passed by reference to every stage that
/// needs it.
#[derive(Clone, Debug, Default)]
pub struct ClassSchema {
    names: Vec<String>,
    by_name: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

impl ClassSchema {
    /// Build a schema from an ordered list of names.
    ///
    /// If a name appears more than once, the first index wins.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut by_name = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(index as u32);
        }
        Self { names, by_name }
    }

    /// Load a schema from a YAML file.
    pub fn load(path: &Path) -> Result<Self, CurateError> {
        if !path.is_file() {
            return Err(CurateError::ConfigMissing {
                path: path.to_path_buf(),
                message: "class schema file not found".to_string(),
            });
        }

        let data = fs::read_to_string(path).map_err(|err| CurateError::ConfigMissing {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_yaml_str(&data, path)
    }

    /// Parse a schema from YAML text. `path` is only used for error context.
    pub fn from_yaml_str(data: &str, path: &Path) -> Result<Self, CurateError> {
        let parsed: DataYaml =
            serde_yaml::from_str(data).map_err(|source| CurateError::ClassSchemaParse {
                path: path.to_path_buf(),
                source,
            })?;

        let names = match parsed.names {
            DataYamlNames::Sequence(names) => names,
            DataYamlNames::Mapping(mapping) => {
                let Some(max_index) = mapping.keys().max().copied() else {
                    return Ok(Self::default());
                };
                if max_index > MAX_CLASS_INDEX {
                    return Err(CurateError::InvalidClassSchema {
                        path: path.to_path_buf(),
                        message: format!(
                            "class index {max_index} exceeds the maximum of {MAX_CLASS_INDEX}"
                        ),
                    });
                }
                let mut names = vec![String::new(); max_index + 1];
                for (index, name) in mapping {
                    names[index] = name;
                }
                for (index, name) in names.iter_mut().enumerate() {
                    if name.trim().is_empty() {
                        *name = format!("class_{}", index);
                    }
                }
                names
            }
        };

        Ok(Self::from_names(names))
    }

    /// Look up the class index for a detector class name.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Look up the class name for an index.
    pub fn name_of(&self, class_id: u32) -> Option<&str> {
        self.names.get(class_id as usize).map(String::as_str)
    }

    /// Ordered class names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
