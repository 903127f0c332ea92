pub mod file_store;
pub mod memory_kv;
pub mod metadata;
pub mod take_writer;

pub use file_store::{FileResponseStore, StorageConfig};
pub use memory_kv::MemoryKeyValueStore;
pub use metadata::SubmissionMetadata;
pub use take_writer::TakeWriter;
