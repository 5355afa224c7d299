//! JSON form of the profile store as written by the slice generator

use std::path::Path;

use serde::Deserialize;

use super::store::{FileProfiles, ProfileStore, StoreError};
use super::{CFunction, DependentVar, SliceProfile, VariableAccess};
use crate::tree::{NodeId, RawNode, SyntaxTree};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub files: Vec<FileDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDocument {
    pub path: String,
    pub tree: RawNode,
    #[serde(default)]
    pub profiles: Vec<ProfileDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDocument {
    pub var_name: String,
    #[serde(default)]
    pub type_name: String,
    pub function_name: String,
    pub defined_position: String,
    /// Disambiguates overloads sharing `function_name`.
    #[serde(default)]
    pub function_position: Option<String>,
    #[serde(default)]
    pub call_sites: Vec<CallSiteDocument>,
    #[serde(default)]
    pub dependent_vars: Vec<DependentVar>,
    #[serde(default)]
    pub used_positions: Vec<VariableAccess>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallSiteDocument {
    pub callee: String,
    pub position: String,
    pub arg_pos_index: usize,
}

impl StoreDocument {
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, StoreError> {
        serde_json::from_str(text).map_err(|e| StoreError::ParseError {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn into_store(self) -> Result<ProfileStore, StoreError> {
        let mut store = ProfileStore::new();
        for file in self.files {
            store.insert_file(file.into_profiles()?)?;
        }
        Ok(store)
    }
}

impl FileDocument {
    fn into_profiles(self) -> Result<FileProfiles, StoreError> {
        let tree = SyntaxTree::from_raw(&self.tree);
        let mut file = FileProfiles::new(&self.path, tree);

        for document in self.profiles {
            let profile = document.into_profile(&file)?;
            file.insert_profile(profile)?;
        }

        Ok(file)
    }
}

impl ProfileDocument {
    fn into_profile(self, file: &FileProfiles) -> Result<SliceProfile, StoreError> {
        let mut profile = SliceProfile::new(
            &file.path,
            &self.var_name,
            &self.type_name,
            &self.function_name,
            &self.defined_position,
        );

        let function_node = if profile.is_global() {
            None
        } else {
            let node = enclosing_function(file, &self.function_name, self.function_position.as_deref())
                .ok_or_else(|| StoreError::UnknownFunction {
                    path: file.path.clone(),
                    name: self.function_name.clone(),
                    key: profile.key(),
                })?;
            Some(node)
        };
        profile.function_node = function_node;

        for site in self.call_sites {
            let record = CFunction::call_site(
                &site.callee,
                &site.position,
                site.arg_pos_index,
                &self.function_name,
                function_node,
            );
            profile.cfunctions.insert(site.callee, record);
        }
        profile.dependent_vars = self.dependent_vars;
        profile.used_positions = self.used_positions;

        Ok(profile)
    }
}

fn enclosing_function(file: &FileProfiles, name: &str, position: Option<&str>) -> Option<NodeId> {
    file.functions_named(name)
        .find(|(key, _)| position.is_none_or(|pos| key.position == pos))
        .map(|(_, node)| *node)
}

impl ProfileStore {
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, StoreError> {
        StoreDocument::from_json_str(text, origin)?.into_store()
    }

    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, &path.display().to_string())
    }
}
