// handlers/public/mod.rs - endpoints that need no token
pub mod invitations;
pub mod root;

pub use invitations::validate as invitation_validate;
pub use root::{health, root};
