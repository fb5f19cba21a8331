//! # Interpreter
//!
//! Single-threaded fetch/charge/execute loop over one code buffer. Storage
//! reads and writes go through the [`StateAccess`] port and are staged in
//! whatever checkpoint layer the caller opened; the interpreter never
//! commits or reverts anything itself.
//!
//! Halting conditions: RETURN (success, output captured), REVERT (failure,
//! output captured), an exceptional halt on invalid opcode, stack fault,
//! memory fault, or out of gas (failure, empty output, all frame gas
//! consumed), or running off the end of the code (implicit success with
//! empty output). Empty code is therefore an immediate success.

use crate::domain::{CallContext, ExecutionResult, Log};
use crate::errors::VmError;
use crate::evm::gas::{self, costs, OPCODE_GAS};
use crate::evm::memory::Memory;
use crate::evm::opcodes::Opcode;
use crate::evm::stack::Stack;
use crate::ports::StateAccess;
use ember_crypto::keccak256;
use ember_types::{Address, Bytes, Hash, StorageKey, StorageValue, U256};
use primitive_types::U512;
use std::collections::HashSet;

/// One execution frame.
pub struct Interpreter<'a, S: StateAccess> {
    context: CallContext,
    code: &'a [u8],
    state: &'a mut S,
    pc: usize,
    stack: Stack,
    memory: Memory,
    output: Bytes,
    logs: Vec<Log>,
    gas_remaining: u64,
    jump_dests: HashSet<usize>,
    stopped: bool,
    reverted: bool,
}

impl<'a, S: StateAccess> Interpreter<'a, S> {
    /// Creates a frame over `code` with the gas budget from `context`.
    pub fn new(context: CallContext, code: &'a [u8], state: &'a mut S) -> Self {
        let gas_remaining = context.gas_limit;
        Self {
            context,
            code,
            state,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            output: Bytes::new(),
            logs: Vec::new(),
            gas_remaining,
            jump_dests: analyze_jump_dests(code),
            stopped: false,
            reverted: false,
        }
    }

    /// Runs to a halting condition and returns the result.
    ///
    /// Termination is guaranteed by gas exhaustion: every opcode that can
    /// keep execution going charges at least 1 gas.
    pub fn run(mut self) -> ExecutionResult {
        while !self.stopped && self.pc < self.code.len() {
            let byte = self.code[self.pc];
            let Some(opcode) = Opcode::from_byte(byte) else {
                return self.halt_exceptionally(VmError::InvalidOpcode(byte));
            };
            if let Err(err) = self.use_gas(OPCODE_GAS[byte as usize]) {
                return self.halt_exceptionally(err);
            }
            if let Err(err) = self.step(opcode) {
                return self.halt_exceptionally(err);
            }
        }

        let gas_used = self.context.gas_limit - self.gas_remaining;
        if self.reverted {
            // Logs never survive a revert; the output is the revert payload.
            ExecutionResult {
                return_data: self.output,
                gas_used,
                reverted: true,
                created_address: None,
                logs: Vec::new(),
                halt: Some(VmError::Revert),
            }
        } else {
            ExecutionResult {
                return_data: self.output,
                gas_used,
                reverted: false,
                created_address: None,
                logs: self.logs,
                halt: None,
            }
        }
    }

    /// An exceptional halt consumes all remaining frame gas.
    fn halt_exceptionally(self, err: VmError) -> ExecutionResult {
        ExecutionResult {
            return_data: Bytes::new(),
            gas_used: self.context.gas_limit,
            reverted: true,
            created_address: None,
            logs: Vec::new(),
            halt: Some(err),
        }
    }

    fn use_gas(&mut self, amount: u64) -> Result<(), VmError> {
        if amount > self.gas_remaining {
            self.gas_remaining = 0;
            return Err(VmError::OutOfGas);
        }
        self.gas_remaining -= amount;
        Ok(())
    }

    /// Charges expansion gas and grows memory to cover `[offset, offset+size)`.
    fn touch_memory(&mut self, offset: usize, size: usize) -> Result<(), VmError> {
        if size == 0 {
            return Ok(());
        }
        let end = offset.saturating_add(size);
        let cost = self.memory.expansion_cost(end)?;
        self.use_gas(cost)?;
        self.memory.expand(end)
    }

    fn pop_usize(&mut self) -> Result<usize, VmError> {
        Ok(clamp_to_usize(self.stack.pop()?))
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, opcode: Opcode) -> Result<(), VmError> {
        self.pc += 1;

        match opcode {
            Opcode::Stop => {
                self.stopped = true;
            }

            // =================================================================
            // ARITHMETIC
            // =================================================================
            Opcode::Add => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_add(b).0)?;
            }
            Opcode::Mul => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_mul(b).0)?;
            }
            Opcode::Sub => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_sub(b).0)?;
            }
            Opcode::Div => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack
                    .push(if b.is_zero() { U256::zero() } else { a / b })?;
            }
            Opcode::SDiv => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    signed_div(a, b)
                };
                self.stack.push(result)?;
            }
            Opcode::Mod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack
                    .push(if b.is_zero() { U256::zero() } else { a % b })?;
            }
            Opcode::SMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    signed_mod(a, b)
                };
                self.stack.push(result)?;
            }
            Opcode::AddMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    narrow((widen(a) + widen(b)) % widen(n))
                };
                self.stack.push(result)?;
            }
            Opcode::MulMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    narrow(widen(a) * widen(b) % widen(n))
                };
                self.stack.push(result)?;
            }
            Opcode::Exp => {
                let base = self.stack.pop()?;
                let exponent = self.stack.pop()?;
                self.use_gas(gas::exp_extra_gas(exponent))?;
                self.stack.push(exp_by_squaring(base, exponent))?;
            }
            Opcode::SignExtend => {
                let k = self.stack.pop()?;
                let x = self.stack.pop()?;
                // k >= 31 extends from the top byte, which is the identity.
                let result = if k < U256::from(31) {
                    let bit_index = 8 * k.as_usize() + 7;
                    let mask = (U256::one() << (bit_index + 1)) - 1;
                    if x.bit(bit_index) {
                        x | !mask
                    } else {
                        x & mask
                    }
                } else {
                    x
                };
                self.stack.push(result)?;
            }

            // =================================================================
            // COMPARISON & BITWISE
            // =================================================================
            Opcode::Lt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a < b))?;
            }
            Opcode::Gt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a > b))?;
            }
            Opcode::SLt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(signed_lt(a, b)))?;
            }
            Opcode::SGt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(signed_lt(b, a)))?;
            }
            Opcode::Eq => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a == b))?;
            }
            Opcode::IsZero => {
                let a = self.stack.pop()?;
                self.stack.push(bool_word(a.is_zero()))?;
            }
            Opcode::And => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a & b)?;
            }
            Opcode::Or => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a | b)?;
            }
            Opcode::Xor => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a ^ b)?;
            }
            Opcode::Not => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Opcode::Byte => {
                let i = self.stack.pop()?;
                let x = self.stack.pop()?;
                let result = if i < U256::from(32) {
                    // Index 0 is the most significant byte.
                    U256::from(x.byte(31 - i.as_usize()))
                } else {
                    U256::zero()
                };
                self.stack.push(result)?;
            }
            Opcode::Shl => {
                let shift = self.stack.pop()?;
                let value = self.stack.pop()?;
                let result = if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value << shift.as_usize()
                };
                self.stack.push(result)?;
            }
            Opcode::Shr => {
                let shift = self.stack.pop()?;
                let value = self.stack.pop()?;
                let result = if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value >> shift.as_usize()
                };
                self.stack.push(result)?;
            }
            Opcode::Sar => {
                let shift = self.stack.pop()?;
                let value = self.stack.pop()?;
                self.stack.push(sar(value, shift))?;
            }

            // =================================================================
            // KECCAK256
            // =================================================================
            Opcode::Keccak256 => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.touch_memory(offset, size)?;
                self.use_gas(gas::keccak_word_gas(size))?;
                let digest = keccak256(&self.memory.read_bytes(offset, size));
                self.stack.push(U256::from_big_endian(digest.as_bytes()))?;
            }

            // =================================================================
            // ENVIRONMENT
            // =================================================================
            Opcode::Address => {
                self.stack.push(address_word(self.context.address))?;
            }
            Opcode::Balance => {
                let address = word_address(self.stack.pop()?);
                let balance = self.state.balance(address);
                self.stack.push(balance)?;
            }
            Opcode::Origin => {
                self.stack.push(address_word(self.context.origin))?;
            }
            Opcode::Caller => {
                self.stack.push(address_word(self.context.caller))?;
            }
            Opcode::CallValue => {
                self.stack.push(self.context.value)?;
            }
            Opcode::CallDataLoad => {
                let offset = self.pop_usize()?;
                let data = self.context.data.as_slice();
                let mut word = [0u8; 32];
                for (i, byte) in word.iter_mut().enumerate() {
                    if let Some(&value) = data.get(offset.saturating_add(i)) {
                        *byte = value;
                    }
                }
                self.stack.push(U256::from_big_endian(&word))?;
            }
            Opcode::CallDataSize => {
                self.stack.push(U256::from(self.context.data.len()))?;
            }
            Opcode::CallDataCopy => {
                let dest = self.pop_usize()?;
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.touch_memory(dest, size)?;
                self.use_gas(gas::copy_word_gas(size))?;
                let chunk = padded_slice(self.context.data.as_slice(), offset, size);
                self.memory.write_bytes(dest, &chunk);
            }
            Opcode::CodeSize => {
                self.stack.push(U256::from(self.code.len()))?;
            }
            Opcode::CodeCopy => {
                let dest = self.pop_usize()?;
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.touch_memory(dest, size)?;
                self.use_gas(gas::copy_word_gas(size))?;
                let chunk = padded_slice(self.code, offset, size);
                self.memory.write_bytes(dest, &chunk);
            }
            Opcode::GasPrice => {
                self.stack.push(self.context.gas_price)?;
            }
            Opcode::ReturnDataSize => {
                // No subcalls in this engine, so the return buffer is
                // always empty.
                self.stack.push(U256::zero())?;
            }
            Opcode::ReturnDataCopy => {
                let _dest = self.pop_usize()?;
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                if offset.saturating_add(size) > 0 {
                    return Err(VmError::ReturnDataOutOfBounds {
                        offset,
                        size,
                        available: 0,
                    });
                }
            }

            // =================================================================
            // BLOCK INFO
            // =================================================================
            Opcode::BlockHash => {
                // No block-hash oracle; out-of-range and unknown blocks
                // read as zero.
                self.stack.pop()?;
                self.stack.push(U256::zero())?;
            }
            Opcode::Coinbase => {
                self.stack.push(address_word(self.context.block.coinbase))?;
            }
            Opcode::Timestamp => {
                self.stack.push(U256::from(self.context.block.timestamp))?;
            }
            Opcode::Number => {
                self.stack.push(U256::from(self.context.block.number))?;
            }
            Opcode::PrevRandao => {
                self.stack.push(self.context.block.prevrandao)?;
            }
            Opcode::GasLimit => {
                self.stack.push(U256::from(self.context.block.gas_limit))?;
            }
            Opcode::ChainId => {
                self.stack.push(U256::from(self.context.block.chain_id))?;
            }
            Opcode::SelfBalance => {
                let balance = self.state.balance(self.context.address);
                self.stack.push(balance)?;
            }
            Opcode::BaseFee => {
                self.stack.push(self.context.block.base_fee)?;
            }

            // =================================================================
            // STACK, MEMORY, STORAGE
            // =================================================================
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::MLoad => {
                let offset = self.pop_usize()?;
                self.touch_memory(offset, 32)?;
                let word = self.memory.read_word(offset);
                self.stack.push(U256::from_big_endian(&word))?;
            }
            Opcode::MStore => {
                let offset = self.pop_usize()?;
                let value = self.stack.pop()?;
                self.touch_memory(offset, 32)?;
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                self.memory.write_word(offset, &word);
            }
            Opcode::MStore8 => {
                let offset = self.pop_usize()?;
                let value = self.stack.pop()?;
                self.touch_memory(offset, 1)?;
                self.memory.write_byte(offset, value.byte(0));
            }
            Opcode::SLoad => {
                let key = StorageKey::from_u256(self.stack.pop()?);
                let value = self.state.storage(self.context.address, key);
                self.stack.push(value.to_u256())?;
            }
            Opcode::SStore => {
                let key = StorageKey::from_u256(self.stack.pop()?);
                let value = self.stack.pop()?;
                let current = self.state.storage(self.context.address, key);
                let cost = if current.is_zero() && !value.is_zero() {
                    costs::SSTORE_SET
                } else {
                    costs::SSTORE_RESET
                };
                self.use_gas(cost)?;
                self.state
                    .set_storage(self.context.address, key, StorageValue::from_u256(value));
            }
            Opcode::Jump => {
                let dest = self.pop_usize()?;
                if !self.jump_dests.contains(&dest) {
                    return Err(VmError::InvalidJump(dest));
                }
                self.pc = dest;
            }
            Opcode::JumpI => {
                let dest = self.pop_usize()?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    if !self.jump_dests.contains(&dest) {
                        return Err(VmError::InvalidJump(dest));
                    }
                    self.pc = dest;
                }
            }
            Opcode::Pc => {
                self.stack.push(U256::from(self.pc - 1))?;
            }
            Opcode::MSize => {
                self.stack.push(U256::from(self.memory.len()))?;
            }
            Opcode::Gas => {
                self.stack.push(U256::from(self.gas_remaining))?;
            }
            Opcode::JumpDest => {
                // Marker only.
            }

            // =================================================================
            // PUSH / DUP / SWAP
            // =================================================================
            Opcode::Push(0) => {
                self.stack.push(U256::zero())?;
            }
            Opcode::Push(n) => {
                let n = usize::from(n);
                let start = self.pc;
                let end = (start + n).min(self.code.len());
                // Truncated immediates pad with zeros, as if the code were
                // extended with zero bytes.
                let mut word = [0u8; 32];
                word[32 - n..32 - n + (end - start)].copy_from_slice(&self.code[start..end]);
                self.stack.push(U256::from_big_endian(&word))?;
                self.pc += n;
            }
            Opcode::Dup(n) => {
                self.stack.dup(usize::from(n) - 1)?;
            }
            Opcode::Swap(n) => {
                self.stack.swap(usize::from(n))?;
            }

            // =================================================================
            // LOGS
            // =================================================================
            Opcode::Log(topic_count) => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                let mut topics = Vec::with_capacity(usize::from(topic_count));
                for _ in 0..topic_count {
                    let mut topic = [0u8; 32];
                    self.stack.pop()?.to_big_endian(&mut topic);
                    topics.push(Hash::new(topic));
                }
                self.touch_memory(offset, size)?;
                self.use_gas(gas::log_extra_gas(size, usize::from(topic_count)))?;
                let data = Bytes::from_vec(self.memory.read_bytes(offset, size));
                self.logs.push(Log::new(self.context.address, topics, data));
            }

            // =================================================================
            // HALTING
            // =================================================================
            Opcode::Return => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.touch_memory(offset, size)?;
                self.output = Bytes::from_vec(self.memory.read_bytes(offset, size));
                self.stopped = true;
            }
            Opcode::Revert => {
                let offset = self.pop_usize()?;
                let size = self.pop_usize()?;
                self.touch_memory(offset, size)?;
                self.output = Bytes::from_vec(self.memory.read_bytes(offset, size));
                self.stopped = true;
                self.reverted = true;
            }
            Opcode::Invalid => {
                return Err(VmError::InvalidOpcode(0xFE));
            }
        }

        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Finds JUMPDEST positions, skipping PUSH immediates.
fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;
    while i < code.len() {
        let byte = code[i];
        if byte == 0x5B {
            dests.insert(i);
        } else if (0x60..=0x7F).contains(&byte) {
            i += usize::from(byte - 0x5F);
        }
        i += 1;
    }
    dests
}

fn clamp_to_usize(value: U256) -> usize {
    if value > U256::from(u64::MAX) {
        usize::MAX
    } else {
        usize::try_from(value.as_u64()).unwrap_or(usize::MAX)
    }
}

fn bool_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

fn address_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

fn word_address(value: U256) -> Address {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    Address::from_slice(&word[12..]).unwrap_or(Address::ZERO)
}

/// Reads `size` bytes at `offset` from `source`, zero-padded past its end.
fn padded_slice(source: &[u8], offset: usize, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    if offset < source.len() {
        let n = (source.len() - offset).min(size);
        out[..n].copy_from_slice(&source[offset..offset + n]);
    }
    out
}

fn widen(value: U256) -> U512 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes[32..]);
    U512::from_big_endian(&bytes)
}

fn narrow(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

fn is_negative(value: U256) -> bool {
    value.bit(255)
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn signed_lt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

fn signed_div(a: U256, b: U256) -> U256 {
    let quotient = abs(a) / abs(b);
    if is_negative(a) == is_negative(b) {
        quotient
    } else {
        twos_complement(quotient)
    }
}

fn signed_mod(a: U256, b: U256) -> U256 {
    let remainder = abs(a) % abs(b);
    // The result takes the dividend's sign.
    if is_negative(a) {
        twos_complement(remainder)
    } else {
        remainder
    }
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        twos_complement(value)
    } else {
        value
    }
}

fn sar(value: U256, shift: U256) -> U256 {
    if shift >= U256::from(256) {
        return if is_negative(value) {
            U256::MAX
        } else {
            U256::zero()
        };
    }
    let shift = shift.as_usize();
    if shift == 0 {
        return value;
    }
    let shifted = value >> shift;
    if is_negative(value) {
        shifted | (U256::MAX << (256 - shift))
    } else {
        shifted
    }
}

fn exp_by_squaring(base: U256, mut exponent: U256) -> U256 {
    let mut result = U256::one();
    let mut base = base;
    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        exponent >>= 1;
        base = base.overflowing_mul(base).0;
    }
    result
}

// =============================================================================
// TESTS
// =============================================================================
