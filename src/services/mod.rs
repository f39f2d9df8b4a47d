pub mod admin_service;
pub mod folder_service;
pub mod processing_service;
pub mod result_service;

pub use folder_service::{FolderService, FileUpload, UploadOutcome, MAX_FILES_PER_FOLDER};
pub use processing_service::{ProcessingService, RunHandle, DEFAULT_RUN_TIMEOUT};
pub use result_service::{get_folder_results, FolderResults};
