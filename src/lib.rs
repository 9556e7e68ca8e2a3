pub mod catalog;
pub mod core;
pub mod payload;
pub mod polling;
pub mod providers;
pub mod registry;
pub mod runtime;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use core::error::{ConfigError, GenerationError, ProviderError, TaskStateError};
pub use core::types::*;
pub use polling::PollPolicy;
pub use registry::{AdapterRegistry, ProviderAdapter};
pub use runtime::{GenerationRuntime, GenerationRuntimeBuilder};
