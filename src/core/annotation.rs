use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    Export,
    Type,
    Class,
    Enum,
    Duplicate {
        #[serde(rename = "duplicateIdentifiers")]
        duplicate_identifiers: Vec<String>,
    },
}

impl AnnotationKind {
    pub const fn label(&self) -> &'static str {
        match self {
            AnnotationKind::Export => "export",
            AnnotationKind::Type => "type",
            AnnotationKind::Class => "class",
            AnnotationKind::Enum => "enum",
            AnnotationKind::Duplicate { .. } => "duplicate",
        }
    }
}

/// A finding that can be pinned to a line of the pull request diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub identifier: String,
    pub start_line: u32,
    pub start_column: u32,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationsCount {
    pub exports: u64,
    pub types: u64,
    pub duplicates: u64,
    pub class_members: u64,
    pub enum_members: u64,
}

impl AnnotationsCount {
    pub fn record(&mut self, kind: &AnnotationKind) {
        match kind {
            AnnotationKind::Export => self.exports += 1,
            AnnotationKind::Type => self.types += 1,
            AnnotationKind::Class => self.class_members += 1,
            AnnotationKind::Enum => self.enum_members += 1,
            AnnotationKind::Duplicate { .. } => self.duplicates += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.exports + self.types + self.duplicates + self.class_members + self.enum_members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_serializes_with_its_identifiers() {
        let annotation = Annotation {
            path: "src/a.ts".to_string(),
            identifier: "A".to_string(),
            start_line: 1,
            start_column: 2,
            kind: AnnotationKind::Duplicate {
                duplicate_identifiers: vec!["default".to_string()],
            },
        };
        let value = serde_json::to_value(&annotation).expect("serialize");
        assert_eq!(value["type"], "duplicate");
        assert_eq!(value["duplicateIdentifiers"][0], "default");
        assert_eq!(value["start_line"], 1);
    }
}
