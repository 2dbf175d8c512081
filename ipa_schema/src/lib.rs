//! # IPA Protocol Schema
//!
//! This crate models the per-pipeline protocol definition: the operations a
//! module exposes, the events it emits, and the types they exchange.
//!
//! ## Philosophy
//!
//! - **Pure data**: a schema has no behavior beyond validation and lookup.
//! - **Build-time shape**: descriptors are `&'static` constants; nothing is
//!   negotiated at runtime beyond version matching.
//! - **Authoring errors fail early**: calling-mode and uniqueness mistakes
//!   are caught by [`ProtocolSchema::validate`], not discovered mid-call.
//!
//! A pipeline type's interface contract (typed trait, client wrapper,
//! dispatcher) is emitted from its schema and kept byte-stable; the schema
//! here is the single source of truth the generated surface is checked
//! against.

pub mod descriptor;
pub mod schema;

pub use descriptor::{
    CallingMode, EventDescriptor, OperationDescriptor, ParamSpec, WireType, EVENT_OPCODE_BASE,
    SHUTDOWN_OPCODE,
};
pub use schema::{ProtocolSchema, SchemaError};
