//! Repository layer for persisting domain models to SQLite
//!
//! Unit structs with associated functions over `&Connection`. Writes that
//! change closure inputs recompute the affected resources' denormalized
//! columns inside the same call.

pub mod alignment;
pub mod hydration;
pub mod mapping;
pub mod resource;
pub mod stat;
pub mod subject;
pub mod taxonomy;

pub use alignment::AlignmentRepo;
pub use mapping::TaxonomyMappingRepo;
pub use resource::ResourceRepo;
pub use stat::ResourceStatRepo;
pub use subject::SubjectRepo;
pub use taxonomy::{TaxonomyRepo, TaxonomyTextColumn};
