//! Device-local persistence

pub mod file_key_value;

pub use file_key_value::FileKeyValueStore;
