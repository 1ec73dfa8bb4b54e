//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Firebase Authentication REST client for the IdentityProvider port
//! - Firestore REST client for the ItemStore port
//! - In-memory backend for demo mode and tests

pub mod firebase_auth;
pub mod firestore;
pub mod memory;
