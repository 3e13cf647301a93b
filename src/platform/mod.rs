//! Collaborators the bootstrap wires together: identity and auth.

pub mod auth;
pub mod identity;
