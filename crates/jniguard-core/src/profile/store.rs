//! Per-file slice profile tables and the language partition over them

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::{SliceKey, SliceProfile};
use crate::tree::{NamePos, NodeId, SyntaxTree, function_declarations};

const MANAGED_EXTENSION: &str = ".java";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read profile store '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid profile store document '{origin}': {message}")]
    ParseError { origin: String, message: String },
    #[error("File '{path}' declares no function '{name}' enclosing profile '{key}'")]
    UnknownFunction {
        path: String,
        name: String,
        key: SliceKey,
    },
    #[error("Slice key '{key}' is defined twice")]
    DuplicateProfile { key: SliceKey },
    #[error("Profile '{key}' does not belong to file '{path}'")]
    ForeignProfile { path: String, key: SliceKey },
    #[error("File '{path}' appears twice in the profile store")]
    DuplicateFile { path: String },
}

/// Which side of the JNI boundary a translation unit lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Managed,
    Native,
}

impl Language {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(MANAGED_EXTENSION) {
            Language::Managed
        } else {
            Language::Native
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Managed => "managed",
            Language::Native => "native",
        }
    }
}

#[derive(Debug)]
pub struct FileProfiles {
    pub path: String,
    pub language: Language,
    pub tree: SyntaxTree,
    pub profiles: BTreeMap<SliceKey, SliceProfile>,
    pub functions: Vec<(NamePos, NodeId)>,
}

impl FileProfiles {
    pub fn new(path: &str, tree: SyntaxTree) -> Self {
        let functions = tree
            .root()
            .map(|unit| function_declarations(&tree, unit))
            .unwrap_or_default();

        Self {
            path: path.to_string(),
            language: Language::from_path(path),
            tree,
            profiles: BTreeMap::new(),
            functions,
        }
    }

    pub fn unit(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn insert_profile(&mut self, profile: SliceProfile) -> Result<(), StoreError> {
        let key = profile.key();
        if key.file_name != self.path {
            return Err(StoreError::ForeignProfile {
                path: self.path.clone(),
                key,
            });
        }
        if self.profiles.contains_key(&key) {
            return Err(StoreError::DuplicateProfile { key });
        }
        self.profiles.insert(key, profile);
        Ok(())
    }

    pub fn profile(&self, key: &SliceKey) -> Option<&SliceProfile> {
        self.profiles.get(key)
    }

    pub fn functions_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a (NamePos, NodeId)> + 'a {
        self.functions.iter().filter(move |(key, _)| key.name == name)
    }
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    files: BTreeMap<String, FileProfiles>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_file(&mut self, file: FileProfiles) -> Result<(), StoreError> {
        if self.files.contains_key(&file.path) {
            return Err(StoreError::DuplicateFile { path: file.path });
        }
        self.files.insert(file.path.clone(), file);
        Ok(())
    }

    pub fn merge(&mut self, other: ProfileStore) -> Result<(), StoreError> {
        for (_, file) in other.files {
            self.insert_file(file)?;
        }
        Ok(())
    }

    pub fn file(&self, path: &str) -> Option<&FileProfiles> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileProfiles> {
        self.files.values()
    }

    /// The universe of files on one side of the JNI boundary, in path order.
    pub fn files_in(&self, language: Language) -> impl Iterator<Item = &FileProfiles> {
        self.files
            .values()
            .filter(move |file| file.language == language)
    }

    /// Looks a profile up in its own file's table, restricted to `universe`.
    pub fn profile_in(&self, key: &SliceKey, universe: Language) -> Option<&SliceProfile> {
        self.files
            .get(&key.file_name)
            .filter(|file| file.language == universe)
            .and_then(|file| file.profile(key))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn profile_count(&self) -> usize {
        self.files.values().map(|file| file.profiles.len()).sum()
    }
}
