//! workshop-common - Shared vocabulary for the workshop stack
//!
//! This crate holds the types shared by the declaration, planning and
//! deployment code. It carries no async runtime or I/O.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`resource_kind`]: Resource kinds and their create/destroy ordering
//! - [`tags`]: Resource tag constants for discovery and cleanup

pub mod defaults;
pub mod resource_kind;
pub mod tags;

pub use resource_kind::ResourceKind;
