//! Namespace ID range admission webhook
//!
//! Assigns every new namespace a disjoint block of user and group IDs and
//! rejects pods whose security context runs outside their namespace's block.

pub mod config;
pub mod error;
pub mod health;
pub mod kubernetes;
pub mod logging;
pub mod ops;
pub mod shutdown;
pub mod state;
pub mod tls;
pub mod tracker;
pub mod webhook;
