//! Per-pipeline protocol schema with authoring-time validation

use crate::descriptor::{
    CallingMode, EventDescriptor, OperationDescriptor, EVENT_OPCODE_BASE, SHUTDOWN_OPCODE,
};
use camera_types::ProtocolVersion;
use std::collections::HashSet;
use thiserror::Error;

/// Schema authoring errors
///
/// These indicate mistakes in a protocol definition, not runtime
/// conditions; a controller validates its schemas once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Duplicate name in schema '{pipeline}': {name}")]
    DuplicateName {
        pipeline: &'static str,
        name: &'static str,
    },

    #[error("Duplicate opcode {opcode:#x} in schema '{pipeline}'")]
    DuplicateOpcode {
        pipeline: &'static str,
        opcode: u32,
    },

    #[error("Operation '{name}' uses reserved opcode {SHUTDOWN_OPCODE}")]
    ReservedOpcode { name: &'static str },

    #[error("Operation '{name}' has the event bit set in opcode {opcode:#x}")]
    OperationInEventRange { name: &'static str, opcode: u32 },

    #[error("Event '{name}' is missing the event bit in opcode {opcode:#x}")]
    EventOutsideEventRange { name: &'static str, opcode: u32 },

    #[error("Asynchronous operation '{name}' declares a return value")]
    AsyncReturn { name: &'static str },
}

/// The complete protocol definition for one pipeline type
///
/// Enumerates every operation and event exactly once. Immutable, shared
/// read-only across all contexts of the pipeline type.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolSchema {
    /// Pipeline type this schema applies to
    pub pipeline: &'static str,
    /// Protocol version implemented by this schema
    pub version: ProtocolVersion,
    /// Operations callable on the module
    pub operations: &'static [OperationDescriptor],
    /// Events the module may emit
    pub events: &'static [EventDescriptor],
}

impl ProtocolSchema {
    /// Validates the schema definition
    ///
    /// Catches authoring errors: duplicate names or opcodes, reserved or
    /// misplaced opcodes, and asynchronous operations declaring returns.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        let mut opcodes = HashSet::new();

        for op in self.operations {
            if op.opcode == SHUTDOWN_OPCODE {
                return Err(SchemaError::ReservedOpcode { name: op.name });
            }
            if op.opcode & EVENT_OPCODE_BASE != 0 {
                return Err(SchemaError::OperationInEventRange {
                    name: op.name,
                    opcode: op.opcode,
                });
            }
            if op.mode == CallingMode::Asynchronous && op.returns.is_some() {
                return Err(SchemaError::AsyncReturn { name: op.name });
            }
            if !names.insert(op.name) {
                return Err(SchemaError::DuplicateName {
                    pipeline: self.pipeline,
                    name: op.name,
                });
            }
            if !opcodes.insert(op.opcode) {
                return Err(SchemaError::DuplicateOpcode {
                    pipeline: self.pipeline,
                    opcode: op.opcode,
                });
            }
        }

        for event in self.events {
            if event.opcode & EVENT_OPCODE_BASE == 0 {
                return Err(SchemaError::EventOutsideEventRange {
                    name: event.name,
                    opcode: event.opcode,
                });
            }
            if !names.insert(event.name) {
                return Err(SchemaError::DuplicateName {
                    pipeline: self.pipeline,
                    name: event.name,
                });
            }
            if !opcodes.insert(event.opcode) {
                return Err(SchemaError::DuplicateOpcode {
                    pipeline: self.pipeline,
                    opcode: event.opcode,
                });
            }
        }

        Ok(())
    }

    /// Looks up an operation by opcode
    pub fn operation(&self, opcode: u32) -> Option<&'static OperationDescriptor> {
        self.operations.iter().find(|op| op.opcode == opcode)
    }

    /// Looks up an operation by name
    pub fn operation_by_name(&self, name: &str) -> Option<&'static OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Looks up an event by opcode
    pub fn event(&self, opcode: u32) -> Option<&'static EventDescriptor> {
        self.events.iter().find(|ev| ev.opcode == opcode)
    }

    /// Checks whether an opcode designates an event
    pub fn is_event_opcode(opcode: u32) -> bool {
        opcode & EVENT_OPCODE_BASE != 0
    }
}
