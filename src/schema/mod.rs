pub mod composer;

pub use composer::{compose_schema, compose_schema_value};
