use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::Category;

/// Findings keyed by file path.
pub type FileMap<T> = BTreeMap<String, T>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<u32>,
}

impl Item {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: None,
            col: None,
            pos: None,
        }
    }

    pub fn at(name: impl Into<String>, line: u32, col: u32, pos: u32) -> Self {
        Self {
            name: name.into(),
            line: Some(line),
            col: Some(col),
            pos: Some(pos),
        }
    }

    /// `(line, column)` when line, column and offset are all known.
    pub fn position(&self) -> Option<(u32, u32)> {
        match (self.line, self.col, self.pos) {
            (Some(line), Some(col), Some(_)) => Some((line, col)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReport {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_peer_dependencies: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unlisted: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub binaries: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unresolved: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub exports: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub types: FileMap<Vec<Item>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub duplicates: FileMap<Vec<Vec<Item>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_members: FileMap<BTreeMap<String, Vec<Item>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub class_members: FileMap<BTreeMap<String, Vec<Item>>>,
}

impl ParsedReport {
    /// The flat `path -> [item]` bucket backing `category`, if it has that shape.
    pub fn items(&self, category: Category) -> Option<&FileMap<Vec<Item>>> {
        match category {
            Category::Dependencies => Some(&self.dependencies),
            Category::DevDependencies => Some(&self.dev_dependencies),
            Category::OptionalPeerDependencies => Some(&self.optional_peer_dependencies),
            Category::Unlisted => Some(&self.unlisted),
            Category::Binaries => Some(&self.binaries),
            Category::Unresolved => Some(&self.unresolved),
            Category::Exports => Some(&self.exports),
            Category::Types => Some(&self.types),
            Category::Duplicates | Category::EnumMembers | Category::ClassMembers => None,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> Option<&mut FileMap<Vec<Item>>> {
        match category {
            Category::Dependencies => Some(&mut self.dependencies),
            Category::DevDependencies => Some(&mut self.dev_dependencies),
            Category::OptionalPeerDependencies => Some(&mut self.optional_peer_dependencies),
            Category::Unlisted => Some(&mut self.unlisted),
            Category::Binaries => Some(&mut self.binaries),
            Category::Unresolved => Some(&mut self.unresolved),
            Category::Exports => Some(&mut self.exports),
            Category::Types => Some(&mut self.types),
            Category::Duplicates | Category::EnumMembers | Category::ClassMembers => None,
        }
    }

    pub fn members(&self, category: Category) -> Option<&FileMap<BTreeMap<String, Vec<Item>>>> {
        match category {
            Category::EnumMembers => Some(&self.enum_members),
            Category::ClassMembers => Some(&self.class_members),
            _ => None,
        }
    }

    pub fn members_mut(
        &mut self,
        category: Category,
    ) -> Option<&mut FileMap<BTreeMap<String, Vec<Item>>>> {
        match category {
            Category::EnumMembers => Some(&mut self.enum_members),
            Category::ClassMembers => Some(&mut self.class_members),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.dependencies.is_empty()
            && self.dev_dependencies.is_empty()
            && self.optional_peer_dependencies.is_empty()
            && self.unlisted.is_empty()
            && self.binaries.is_empty()
            && self.unresolved.is_empty()
            && self.exports.is_empty()
            && self.types.is_empty()
            && self.duplicates.is_empty()
            && self.enum_members.is_empty()
            && self.class_members.is_empty()
    }

    /// Total number of findings across every bucket.
    pub fn finding_count(&self) -> usize {
        let flat = [
            &self.dependencies,
            &self.dev_dependencies,
            &self.optional_peer_dependencies,
            &self.unlisted,
            &self.binaries,
            &self.unresolved,
            &self.exports,
            &self.types,
        ]
        .into_iter()
        .flat_map(|bucket| bucket.values())
        .map(Vec::len)
        .sum::<usize>();
        let duplicates = self
            .duplicates
            .values()
            .flatten()
            .map(Vec::len)
            .sum::<usize>();
        let members = [&self.enum_members, &self.class_members]
            .into_iter()
            .flat_map(|bucket| bucket.values())
            .flat_map(|containers| containers.values())
            .map(Vec::len)
            .sum::<usize>();
        self.files.len() + flat + duplicates + members
    }
}
