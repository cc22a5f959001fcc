//! Shared helpers

pub mod encoding;
pub mod hashing;
pub mod paths;

pub use encoding::{decode_lenient, read_file_lenient};
pub use hashing::content_hash;
pub use paths::{has_hidden_component, normalize_path};
