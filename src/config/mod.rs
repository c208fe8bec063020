//! Entity configuration model and the editing session built on it

pub mod entity;
pub mod session;

pub use entity::{
    ApiConfiguration, Authorization, CustomRoute, DataType, EndpointFlags, EndpointKind,
    EntityConfig, EntityField, Pagination, Permission, Relationship, Role, ServerAddress,
    Validation, ValidationRule,
};
pub use session::{ConfigSession, FieldAttribute, ImportedColumn};
