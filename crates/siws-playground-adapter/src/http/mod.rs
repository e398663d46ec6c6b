/*
[INPUT]:  HTTP client configuration, RPC endpoint and auth backend URLs
[OUTPUT]: HTTP responses, JSON-RPC results and typed errors
[POS]:    HTTP layer - Solana RPC and auth backend communication
[UPDATE]: When adding new RPC methods or changing client behavior
*/

pub mod client;
pub mod error;
pub mod rpc;

pub use error::{PlaygroundError, Result};

pub use client::{ClientConfig, PlaygroundClient};
