pub mod json_loader;
pub mod request_loader;

pub use json_loader::{load_and_merge_raw_questions, load_raw_questions, save_questions};
pub use request_loader::{load_all_request_files, load_request_file, RequestFile};
