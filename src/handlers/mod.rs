// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, `Caller` injected by middleware)
pub mod public;
pub mod protected;
