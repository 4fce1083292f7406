#![forbid(unsafe_code)]

pub mod api;
pub mod dataset;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod history;
pub mod navigator;
pub mod selection;
pub mod view;

pub use api::{ApiClient, ApiConfig, JudgeVerdict};
pub use dataset::DatasetService;
pub use discovery::{SetDescriptor, SetDiscovery, StaticDiscovery};
pub use error::{ApiError, DatasetError, FetchError, PickError};
pub use fetch::{DocumentFetcher, HttpFetcher};
pub use history::{HistoryRecord, HistorySink, InMemoryHistory};
pub use navigator::{NavOutcome, Navigator, Screen};
pub use selection::{PickedProblem, SelectionEngine};
pub use view::ViewSink;
