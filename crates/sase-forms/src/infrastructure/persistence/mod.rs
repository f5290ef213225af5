//! Form repository implementations

mod json_file;
mod memory;

pub use json_file::JsonFileFormRepository;
pub use memory::InMemoryFormRepository;
