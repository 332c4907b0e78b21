//! Port traits implemented by infrastructure adapters.

mod network_provider;

pub use network_provider::NetworkProvider;
