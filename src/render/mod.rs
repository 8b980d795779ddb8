//! Turns a [`ParsedReport`] into markdown sections and check-run annotations.

pub mod table;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::{
    Annotation, AnnotationKind, Category, CategoryShape, FileMap, Item, ParsedReport,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedReport {
    pub sections: Vec<String>,
    pub annotations: Vec<Annotation>,
}

/// Table sections are split so each stays shorter than `section_budget`.
pub fn render(
    report: &ParsedReport,
    annotations: bool,
    verbose: bool,
    section_budget: usize,
) -> RenderedReport {
    let mut out = RenderedReport::default();
    let tables = verbose || !annotations;

    if !report.files.is_empty() {
        out.sections.push(files_section(&report.files));
    }

    for category in Category::ALL {
        match category.shape() {
            CategoryShape::Plain => {
                if let Some(bucket) = report.items(category) {
                    out.sections.extend(plain_sections(category, bucket, section_budget));
                }
            }
            CategoryShape::Positioned => {
                let Some(bucket) = report.items(category) else {
                    continue;
                };
                let kind = match category {
                    Category::Types => AnnotationKind::Type,
                    _ => AnnotationKind::Export,
                };
                if annotations {
                    out.annotations.extend(positioned_annotations(bucket, &kind));
                }
                if tables {
                    out.sections.extend(plain_sections(category, bucket, section_budget));
                }
            }
            CategoryShape::Grouped => {
                if annotations {
                    out.annotations.extend(duplicate_annotations(&report.duplicates));
                }
                if tables {
                    out.sections.extend(duplicate_sections(&report.duplicates, section_budget));
                }
            }
            CategoryShape::Members => {
                let Some(bucket) = report.members(category) else {
                    continue;
                };
                let kind = match category {
                    Category::ClassMembers => AnnotationKind::Class,
                    _ => AnnotationKind::Enum,
                };
                if annotations {
                    out.annotations.extend(member_annotations(bucket, &kind));
                }
                if tables {
                    out.sections.extend(member_sections(category, bucket, section_budget));
                }
            }
        }
    }

    out
}

fn header(name: &str, count: usize) -> String {
    format!("### {name} ({count})")
}

fn backticked(items: &[Item]) -> Vec<String> {
    items.iter().map(|i| format!("`{}`", i.name)).collect()
}

fn files_section(files: &[String]) -> String {
    let list: Vec<String> = files.iter().map(|f| format!("`{f}`")).collect();
    format!("{}\n\n{}", header("Unused files", files.len()), list.join(", "))
}

fn plain_sections(category: Category, bucket: &FileMap<Vec<Item>>, budget: usize) -> Vec<String> {
    if bucket.is_empty() {
        return Vec::new();
    }
    let count = bucket.values().map(Vec::len).sum();
    let rows: Vec<Vec<String>> = bucket
        .iter()
        .map(|(file, items)| vec![file.clone(), backticked(items).join("<br/>")])
        .collect();
    table::split(
        &header(category.display_name(), count),
        &["Filename".to_string(), category.display_name().to_string()],
        &rows,
        budget,
    )
}

fn duplicate_sections(bucket: &FileMap<Vec<Vec<Item>>>, budget: usize) -> Vec<String> {
    if bucket.is_empty() {
        return Vec::new();
    }
    let count = bucket.values().flatten().map(Vec::len).sum();
    let rows: Vec<Vec<String>> = bucket
        .iter()
        .map(|(file, groups)| {
            let cell = groups
                .iter()
                .map(|group| backticked(group).join(", "))
                .collect::<Vec<_>>()
                .join("<br/>");
            vec![file.clone(), cell]
        })
        .collect();
    let name = Category::Duplicates.display_name();
    table::split(
        &header(name, count),
        &["Filename".to_string(), name.to_string()],
        &rows,
        budget,
    )
}

fn member_sections(
    category: Category,
    bucket: &FileMap<BTreeMap<String, Vec<Item>>>,
    budget: usize,
) -> Vec<String> {
    if bucket.is_empty() {
        return Vec::new();
    }
    let container = match category {
        Category::ClassMembers => "Class",
        _ => "Enum",
    };
    let mut count = 0;
    let mut rows = Vec::new();
    for (file, containers) in bucket {
        for (name, members) in containers {
            count += members.len();
            rows.push(vec![
                file.clone(),
                name.clone(),
                backticked(members).join("<br/>"),
            ]);
        }
    }
    table::split(
        &header(category.display_name(), count),
        &[
            "Filename".to_string(),
            container.to_string(),
            "Member".to_string(),
        ],
        &rows,
        budget,
    )
}

fn annotation(file: &str, item: &Item, kind: AnnotationKind) -> Option<Annotation> {
    let (start_line, start_column) = item.position()?;
    Some(Annotation {
        path: file.to_string(),
        identifier: item.name.clone(),
        start_line,
        start_column,
        kind,
    })
}

fn positioned_annotations<'a>(
    bucket: &'a FileMap<Vec<Item>>,
    kind: &'a AnnotationKind,
) -> impl Iterator<Item = Annotation> + 'a {
    bucket.iter().flat_map(move |(file, items)| {
        items
            .iter()
            .filter_map(move |item| annotation(file, item, kind.clone()))
    })
}

fn member_annotations<'a>(
    bucket: &'a FileMap<BTreeMap<String, Vec<Item>>>,
    kind: &'a AnnotationKind,
) -> impl Iterator<Item = Annotation> + 'a {
    bucket.iter().flat_map(move |(file, containers)| {
        containers
            .values()
            .flatten()
            .filter_map(move |item| annotation(file, item, kind.clone()))
    })
}

fn duplicate_annotations(bucket: &FileMap<Vec<Vec<Item>>>) -> Vec<Annotation> {
    let mut out = Vec::new();
    for (file, groups) in bucket {
        for group in groups {
            for (idx, item) in group.iter().enumerate() {
                let others = group
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != idx)
                    .map(|(_, other)| other.name.clone())
                    .collect();
                let kind = AnnotationKind::Duplicate {
                    duplicate_identifiers: others,
                };
                out.extend(annotation(file, item, kind));
            }
        }
    }
    out
}
