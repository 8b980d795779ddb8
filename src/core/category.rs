use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a category's per-file payload is shaped in knip's JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryShape {
    /// `path -> [item]`, rendered as a plain table and never annotated.
    Plain,
    /// `path -> [item]`, items may carry a source position.
    Positioned,
    /// `path -> [[item]]`, each inner list is one group of aliases.
    Grouped,
    /// `path -> {container -> [item]}`.
    Members,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Dependencies,
    DevDependencies,
    OptionalPeerDependencies,
    Unlisted,
    Binaries,
    Unresolved,
    Exports,
    Types,
    EnumMembers,
    ClassMembers,
    Duplicates,
}

impl Category {
    /// Render order of the keyed buckets.
    pub const ALL: [Category; 11] = [
        Category::Dependencies,
        Category::DevDependencies,
        Category::OptionalPeerDependencies,
        Category::Unlisted,
        Category::Binaries,
        Category::Unresolved,
        Category::Exports,
        Category::Types,
        Category::EnumMembers,
        Category::ClassMembers,
        Category::Duplicates,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Category::Dependencies => "dependencies",
            Category::DevDependencies => "devDependencies",
            Category::OptionalPeerDependencies => "optionalPeerDependencies",
            Category::Unlisted => "unlisted",
            Category::Binaries => "binaries",
            Category::Unresolved => "unresolved",
            Category::Exports => "exports",
            Category::Types => "types",
            Category::EnumMembers => "enumMembers",
            Category::ClassMembers => "classMembers",
            Category::Duplicates => "duplicates",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Category::Dependencies => "Unused dependencies",
            Category::DevDependencies => "Unused devDependencies",
            Category::OptionalPeerDependencies => "Unused optionalPeerDependencies",
            Category::Unlisted => "Unlisted dependencies",
            Category::Binaries => "Unlisted binaries",
            Category::Unresolved => "Unresolved imports",
            Category::Exports => "Unused exports",
            Category::Types => "Unused types",
            Category::EnumMembers => "Unused Enum Members",
            Category::ClassMembers => "Unused Class Members",
            Category::Duplicates => "Duplicates",
        }
    }

    pub const fn shape(self) -> CategoryShape {
        match self {
            Category::Dependencies
            | Category::DevDependencies
            | Category::OptionalPeerDependencies
            | Category::Unlisted
            | Category::Binaries
            | Category::Unresolved => CategoryShape::Plain,
            Category::Exports | Category::Types => CategoryShape::Positioned,
            Category::Duplicates => CategoryShape::Grouped,
            Category::EnumMembers | Category::ClassMembers => CategoryShape::Members,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| format!("Unknown name: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_match_the_lookup_table() {
        let expected = [
            ("dependencies", "Unused dependencies"),
            ("devDependencies", "Unused devDependencies"),
            ("optionalPeerDependencies", "Unused optionalPeerDependencies"),
            ("exports", "Unused exports"),
            ("types", "Unused types"),
            ("unresolved", "Unresolved imports"),
            ("binaries", "Unlisted binaries"),
            ("unlisted", "Unlisted dependencies"),
            ("duplicates", "Duplicates"),
        ];
        for (key, name) in expected {
            let category: Category = key.parse().expect("known key");
            assert_eq!(category.display_name(), name);
            assert_eq!(category.key(), key);
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = "sheepinator".parse::<Category>().unwrap_err();
        assert_eq!(err, "Unknown name: sheepinator");
    }
}
