//! Soft pipeline protocol contract
//!
//! Opcode assignments and calling modes for the software ISP pipeline
//! type. Changing any value here breaks wire compatibility with modules
//! built against the previous assignment.
