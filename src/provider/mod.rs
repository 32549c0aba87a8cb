//! Baseline and alert providers.
//!
//! The engine never knows where a baseline came from. Callers inject a
//! `BaselineDataProvider` (and, where alerts seed simulations, an
//! `AlertRegistry`) into the transport layer. In-memory implementations are
//! provided for tests and embedded use; a production deployment plugs in its
//! own implementation backed by whatever data source it uses.

mod memory;
mod traits;

pub use memory::{AlertBaselineProvider, InMemoryAlertRegistry, InMemoryBaselineProvider};
pub use traits::{AlertRegistry, BaselineDataProvider};
