/*
[INPUT]:  Domain schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions shared by auth and RPC layers
[UPDATE]: When the sign-in schema or cluster list changes
*/

pub mod enums;
pub mod models;

pub use enums::*;
pub use models::*;
