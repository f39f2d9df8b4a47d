pub mod document_types;
pub mod entities;
pub mod files;
pub mod folders;
pub mod health;
pub mod processing;
pub mod schema;
pub mod templates;
