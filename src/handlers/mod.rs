pub mod auth;
pub mod proposals;
