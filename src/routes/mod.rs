//! Router Module Index
//!
//! Splits the routing table by access level so the admin gate is applied to a whole
//! router at once instead of handler by handler.

/// Routes accessible to anyone: menu browsing, sign-up and login.
pub mod public;

/// Routes restricted to accounts with the 'admin' role.
/// `create_router` wraps this router in the `require_admin` route layer.
pub mod admin;
