pub mod backend;
pub mod providers;
pub mod registry;

pub use backend::LlmBackend;
pub use registry::BackendRegistry;
