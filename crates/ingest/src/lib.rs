pub mod api;
pub mod dataset;
pub mod error;
pub mod pipeline;

pub use api::{ApiFetcher, SourceFetcher};
pub use dataset::{DatasetFetcher, KaggleFetcher, StagedFile, Staging};
pub use error::{FetchError, IngestError};
pub use pipeline::Pipeline;
