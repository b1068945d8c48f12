//! Scripted in-memory driver for exercising the conduit without a real
//! backend. Available behind the `test-utils` feature.

mod memory;

pub use memory::{MemoryConnection, MemoryFactory};
