pub mod blob;
pub mod bronze;
pub mod error;
pub mod memory;
pub mod s3;

pub use blob::{BlobStore, ObjectInfo};
pub use bronze::{object_key, BronzeWriter};
pub use error::StoreError;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;
