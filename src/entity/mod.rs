//! Entity Store boundary
//!
//! Typed, validated Role/Skill/Field/resource records and the document store
//! trait the graph builder reads from.

mod records;
mod store;

pub use records::{FieldRecord, LearningResource, RequiredSkill, RoleRecord, SkillRecord};
pub use store::{EntityStore, MemoryEntityStore};
