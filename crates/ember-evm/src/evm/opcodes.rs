//! # Opcode Decoding
//!
//! The supported opcode set. Bytes outside it decode to `None` and fault
//! execution with `InvalidOpcode`; the CALL/CREATE family, EXTCODE*,
//! SELFDESTRUCT, and transient storage are deliberately unsupported.

/// A decoded opcode. PUSH/DUP/SWAP/LOG carry their operand count instead of
/// one variant per width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 0x00: halt execution.
    Stop,
    /// 0x01: wrapping addition.
    Add,
    /// 0x02: wrapping multiplication.
    Mul,
    /// 0x03: wrapping subtraction.
    Sub,
    /// 0x04: unsigned division (x / 0 = 0).
    Div,
    /// 0x05: signed division.
    SDiv,
    /// 0x06: unsigned remainder (x % 0 = 0).
    Mod,
    /// 0x07: signed remainder.
    SMod,
    /// 0x08: (a + b) % n with 512-bit intermediate.
    AddMod,
    /// 0x09: (a * b) % n with 512-bit intermediate.
    MulMod,
    /// 0x0A: exponentiation.
    Exp,
    /// 0x0B: sign-extend from a byte boundary.
    SignExtend,
    /// 0x10: unsigned less-than.
    Lt,
    /// 0x11: unsigned greater-than.
    Gt,
    /// 0x12: signed less-than.
    SLt,
    /// 0x13: signed greater-than.
    SGt,
    /// 0x14: equality.
    Eq,
    /// 0x15: is-zero.
    IsZero,
    /// 0x16: bitwise and.
    And,
    /// 0x17: bitwise or.
    Or,
    /// 0x18: bitwise xor.
    Xor,
    /// 0x19: bitwise not.
    Not,
    /// 0x1A: extract one byte.
    Byte,
    /// 0x1B: shift left.
    Shl,
    /// 0x1C: logical shift right.
    Shr,
    /// 0x1D: arithmetic shift right.
    Sar,
    /// 0x20: keccak-256 over a memory range.
    Keccak256,
    /// 0x30: executing account's address.
    Address,
    /// 0x31: balance of an account.
    Balance,
    /// 0x32: transaction origin.
    Origin,
    /// 0x33: immediate caller.
    Caller,
    /// 0x34: attached value.
    CallValue,
    /// 0x35: load a calldata word.
    CallDataLoad,
    /// 0x36: calldata length.
    CallDataSize,
    /// 0x37: copy calldata into memory.
    CallDataCopy,
    /// 0x38: code length.
    CodeSize,
    /// 0x39: copy code into memory.
    CodeCopy,
    /// 0x3A: transaction gas price.
    GasPrice,
    /// 0x3D: size of the last return buffer.
    ReturnDataSize,
    /// 0x3E: copy from the last return buffer.
    ReturnDataCopy,
    /// 0x40: historical block hash (always zero here).
    BlockHash,
    /// 0x41: block proposer.
    Coinbase,
    /// 0x42: block timestamp.
    Timestamp,
    /// 0x43: block number.
    Number,
    /// 0x44: prevrandao.
    PrevRandao,
    /// 0x45: block gas limit.
    GasLimit,
    /// 0x46: chain id.
    ChainId,
    /// 0x47: executing account's balance.
    SelfBalance,
    /// 0x48: base fee.
    BaseFee,
    /// 0x50: discard the top of the stack.
    Pop,
    /// 0x51: load a memory word.
    MLoad,
    /// 0x52: store a memory word.
    MStore,
    /// 0x53: store a single byte.
    MStore8,
    /// 0x54: storage read.
    SLoad,
    /// 0x55: storage write.
    SStore,
    /// 0x56: unconditional jump.
    Jump,
    /// 0x57: conditional jump.
    JumpI,
    /// 0x58: program counter of this opcode.
    Pc,
    /// 0x59: memory size in bytes.
    MSize,
    /// 0x5A: remaining gas after this charge.
    Gas,
    /// 0x5B: jump target marker.
    JumpDest,
    /// 0x5F..0x7F: push `n` immediate bytes (0 for PUSH0).
    Push(u8),
    /// 0x80..0x8F: duplicate the n-th item (1-indexed).
    Dup(u8),
    /// 0x90..0x9F: swap the top with the n-th item below it (1-indexed).
    Swap(u8),
    /// 0xA0..0xA4: emit a log with `n` topics.
    Log(u8),
    /// 0xF3: halt returning a memory range.
    Return,
    /// 0xFD: halt reverting with a memory range.
    Revert,
    /// 0xFE: designated invalid opcode.
    Invalid,
}

impl Opcode {
    /// Decodes a byte; `None` for anything outside the supported set.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Stop,
            0x01 => Self::Add,
            0x02 => Self::Mul,
            0x03 => Self::Sub,
            0x04 => Self::Div,
            0x05 => Self::SDiv,
            0x06 => Self::Mod,
            0x07 => Self::SMod,
            0x08 => Self::AddMod,
            0x09 => Self::MulMod,
            0x0A => Self::Exp,
            0x0B => Self::SignExtend,
            0x10 => Self::Lt,
            0x11 => Self::Gt,
            0x12 => Self::SLt,
            0x13 => Self::SGt,
            0x14 => Self::Eq,
            0x15 => Self::IsZero,
            0x16 => Self::And,
            0x17 => Self::Or,
            0x18 => Self::Xor,
            0x19 => Self::Not,
            0x1A => Self::Byte,
            0x1B => Self::Shl,
            0x1C => Self::Shr,
            0x1D => Self::Sar,
            0x20 => Self::Keccak256,
            0x30 => Self::Address,
            0x31 => Self::Balance,
            0x32 => Self::Origin,
            0x33 => Self::Caller,
            0x34 => Self::CallValue,
            0x35 => Self::CallDataLoad,
            0x36 => Self::CallDataSize,
            0x37 => Self::CallDataCopy,
            0x38 => Self::CodeSize,
            0x39 => Self::CodeCopy,
            0x3A => Self::GasPrice,
            0x3D => Self::ReturnDataSize,
            0x3E => Self::ReturnDataCopy,
            0x40 => Self::BlockHash,
            0x41 => Self::Coinbase,
            0x42 => Self::Timestamp,
            0x43 => Self::Number,
            0x44 => Self::PrevRandao,
            0x45 => Self::GasLimit,
            0x46 => Self::ChainId,
            0x47 => Self::SelfBalance,
            0x48 => Self::BaseFee,
            0x50 => Self::Pop,
            0x51 => Self::MLoad,
            0x52 => Self::MStore,
            0x53 => Self::MStore8,
            0x54 => Self::SLoad,
            0x55 => Self::SStore,
            0x56 => Self::Jump,
            0x57 => Self::JumpI,
            0x58 => Self::Pc,
            0x59 => Self::MSize,
            0x5A => Self::Gas,
            0x5B => Self::JumpDest,
            0x5F..=0x7F => Self::Push(byte - 0x5F),
            0x80..=0x8F => Self::Dup(byte - 0x7F),
            0x90..=0x9F => Self::Swap(byte - 0x8F),
            0xA0..=0xA4 => Self::Log(byte - 0xA0),
            0xF3 => Self::Return,
            0xFD => Self::Revert,
            0xFE => Self::Invalid,
            _ => return None,
        })
    }

    /// Number of immediate bytes following a PUSH; `None` otherwise.
    #[must_use]
    pub fn push_size(&self) -> Option<usize> {
        match self {
            Self::Push(n) => Some(usize::from(*n)),
            _ => None,
        }
    }

    /// True if this opcode ends execution.
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        matches!(self, Self::Stop | Self::Return | Self::Revert | Self::Invalid)
    }
}

// =============================================================================
// TESTS
// =============================================================================
