//! Use-case services orchestrating the core engine.
//!
//! # Responsibility
//! - Expose intent-level operations to UI collaborators.
//! - Keep persistence deliberate: snapshot after each successful mutation.

pub mod notebook;
