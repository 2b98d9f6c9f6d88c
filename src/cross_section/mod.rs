//! Cross-section definitions and the predicates that gate where they may be
//! placed.

pub mod definition;
pub mod validator;

pub use definition::{
    CrossSectionDefinition, ProfileKind, Section, SectionType, StandardProfile, StandardShape,
    XyzProfile, YzProfile, ZwProfile, ZwRow,
};
pub use validator::{ShapeCatalog, StandardShapeCatalog, ValidationOutcome};
