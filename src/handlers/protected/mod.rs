// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Route prefix: /api/*
// Every request rebuilds the hierarchy from the live staff source.
pub mod hierarchy;
pub mod share;

pub use hierarchy::{hierarchy_get, hierarchy_layout, subtree_get};
pub use share::{share_create, share_revoke};
