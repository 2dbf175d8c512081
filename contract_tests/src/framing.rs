//! Wire frame layout contract
//!
//! The frame is the interoperability boundary between independently
//! built stubs. Layout, all integers little-endian:
//!
//! `[length:u32][opcode:u32][correlation:u32][payload_len:u32][payload]`
//! `[handle_count:u32][id:u32 len:u64]...`
//!
//! `length` covers everything after itself.
