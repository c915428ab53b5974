//! JVM opcodes the visitor cares about, and instruction lengths for the rest

use crate::error::ClassFileError;

pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const IINC: u8 = 0x84;
pub const GOTO: u8 = 0xa7;
pub const JSR: u8 = 0xa8;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;

/// Total length in bytes of the instruction starting at `offset`
pub fn instruction_length(code: &[u8], offset: usize) -> Result<usize, ClassFileError> {
    let opcode = code[offset];
    let length = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        LDC => 2,
        LDC_W | LDC2_W => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa6 | GOTO | JSR => 3,
        0xa9 => 2,
        TABLESWITCH => tableswitch_length(code, offset)?,
        LOOKUPSWITCH => lookupswitch_length(code, offset)?,
        0xac..=0xb1 => 1,
        GETSTATIC..=INVOKESTATIC => 3,
        INVOKEINTERFACE | INVOKEDYNAMIC => 5,
        NEW => 3,
        NEWARRAY => 2,
        ANEWARRAY => 3,
        0xbe | 0xbf => 1,
        CHECKCAST | INSTANCEOF => 3,
        0xc2 | 0xc3 => 1,
        WIDE => wide_length(code, offset)?,
        MULTIANEWARRAY => 4,
        0xc6 | 0xc7 => 3,
        GOTO_W | JSR_W => 5,
        0xca | 0xfe | 0xff => 1,
        _ => return Err(ClassFileError::UnsupportedOpcode { opcode, offset }),
    };
    Ok(length)
}

/// Switch operands are aligned to 4 bytes from the start of the code array
fn padding(offset: usize) -> usize {
    (4 - ((offset + 1) % 4)) % 4
}

fn tableswitch_length(code: &[u8], offset: usize) -> Result<usize, ClassFileError> {
    let pad = padding(offset);
    let base = offset + 1 + pad;
    let low = read_i32_at(code, base + 4)?;
    let high = read_i32_at(code, base + 8)?;
    let count = high
        .checked_sub(low)
        .and_then(|span| span.checked_add(1))
        .filter(|count| *count >= 0)
        .ok_or(ClassFileError::MalformedAttribute("tableswitch"))?;
    Ok(1 + pad + 12 + count as usize * 4)
}

fn lookupswitch_length(code: &[u8], offset: usize) -> Result<usize, ClassFileError> {
    let pad = padding(offset);
    let base = offset + 1 + pad;
    let pairs = read_i32_at(code, base + 4)?;
    if pairs < 0 {
        return Err(ClassFileError::MalformedAttribute("lookupswitch"));
    }
    Ok(1 + pad + 8 + pairs as usize * 8)
}

fn wide_length(code: &[u8], offset: usize) -> Result<usize, ClassFileError> {
    let modified = code.get(offset + 1).copied().ok_or(ClassFileError::UnexpectedEof {
        offset: offset + 1,
        wanted: 1,
    })?;
    Ok(if modified == IINC { 6 } else { 4 })
}

pub fn read_u16_at(code: &[u8], offset: usize) -> Result<u16, ClassFileError> {
    code.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(ClassFileError::UnexpectedEof { offset, wanted: 2 })
}

fn read_i32_at(code: &[u8], offset: usize) -> Result<i32, ClassFileError> {
    code.get(offset..offset + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ClassFileError::UnexpectedEof { offset, wanted: 4 })
}
