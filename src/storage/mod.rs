pub mod migrate;
pub mod persistence;

pub use migrate::normalize;
pub use persistence::{CANDIDATE_FILENAMES, DEFAULT_FILENAME, DocumentStore, resolve_data_path};
