// handlers/protected/mod.rs - JWT authentication required
//
// Route prefix: /api/*. Every handler receives the verified `Caller` as a
// request extension and scopes its work to the caller's organization.
pub mod achievements;
pub mod assignments;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod goals;
pub mod invitations;
pub mod tests;
pub mod utils;
