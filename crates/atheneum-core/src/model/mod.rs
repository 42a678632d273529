//! Domain models for the Atheneum catalog

mod alignment;
mod enums;
mod resource;
mod stat;
mod subject;
mod taxonomy;

pub use alignment::{Alignment, AlignmentStatus};
pub use enums::{
    ACCESSIBILITY_API, ACCESSIBILITY_HAZARDS, ACCESSIBILITY_INPUT_METHODS, ACCESS_MODE,
    EDUCATIONAL_AUDIENCE, LEARNING_RESOURCE_TYPES, TEXT_COMPLEXITY_METRICS,
};
pub use resource::Resource;
pub use stat::ResourceStat;
pub use subject::Subject;
pub use taxonomy::{Taxonomy, TaxonomyMapping};
