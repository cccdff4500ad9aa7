//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password credential codec (Argon2id, self-describing encoded format)
//! - Cryptographic utilities (secure random, opaque tokens, Base64)

pub mod credential;
pub mod crypto;
