// handlers/mod.rs - two-tier handler layout
//
// Public (no auth, share links only) → Protected (JWT, live staff data)
pub mod protected;
pub mod public;
