//! The decision and patch compilation engine of `envinjector`.
//!
//! A run takes a shell-operator binding context, works out for every
//! observed container which required environment variables it lacks, and
//! produces a patch document telling the operator how to add them:
//!
//! 1. [`decode`] turns the binding context into [`model::Entity`] values.
//! 2. [`catalog::RequirementCatalog::resolve`] computes each container's
//!    additions.
//! 3. [`compile`] turns non-empty additions into structured
//!    [`compile::PatchOperation`]s targeting one container's `env`.
//! 4. [`encode`] renders those as `JQPatch` or `JSONPatch` operations, and
//!    [`boundary::Sink`] delivers the document atomically.
//!
//! Runs are stateless; nothing survives from one invocation to the next.

pub mod boundary;
pub mod catalog;
pub mod compile;
pub mod decode;
pub mod encode;
pub mod error;
pub mod interrupt;
pub mod model;
pub mod pipeline;
pub mod report;

pub use error::{DecodeError, Error};
