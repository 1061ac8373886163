//! Script opcode range.
//!
//! Only the byte values matter here: nothing in this crate evaluates scripts.
//! Values above [`MAX_OPCODE`] are not instructions.

/// Last of the expansion NOPs, the highest defined instruction.
pub const OP_NOP10: u8 = 0xb9;

/// Highest byte value that is a defined instruction.
pub const MAX_OPCODE: u8 = OP_NOP10;

/// Whether `byte` falls inside the defined instruction range.
pub fn is_opcode(byte: u8) -> bool {
    byte <= MAX_OPCODE
}
