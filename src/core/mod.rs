mod annotation;
mod category;
mod report;

pub use annotation::{Annotation, AnnotationKind, AnnotationsCount};
pub use category::{Category, CategoryShape};
pub use report::{FileMap, Item, ParsedReport};

/// GitHub's documented maximum issue comment body length.
pub const MAX_COMMENT_LENGTH: usize = 65535;

/// The Checks API accepts at most 50 annotations per update request.
pub const CHECK_ANNOTATIONS_UPDATE_LIMIT: usize = 50;
