pub mod document_types;
pub mod entities;
pub mod files;
pub mod folders;
pub mod processing_results;
pub mod templates;

pub use document_types::Entity as DocumentTypes;
pub use entities::Entity as Entities;
pub use files::Entity as Files;
pub use folders::Entity as Folders;
pub use processing_results::Entity as ProcessingResults;
pub use templates::Entity as Templates;
