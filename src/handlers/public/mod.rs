// handlers/public/mod.rs - endpoints reachable without a JWT
//
// Route prefix: /public/*
// Anyone holding a share token sees that one frozen snapshot and nothing else.
pub mod share;

pub use share::{share_get, share_layout};
