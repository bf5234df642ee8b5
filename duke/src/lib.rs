//! Structural types for a single decoded JVM method: names, descriptors and bytecode
//! instructions, with constant-pool references already resolved.

mod macros;
pub mod tree;
