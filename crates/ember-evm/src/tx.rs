//! # Transactions
//!
//! Unsigned transaction payloads, deterministic signing hashes, and signed
//! transactions with sender recovery. A transaction with `to == None` is a
//! contract creation; its `data` is the init code.

use ember_crypto::{keccak256, recover_address, CryptoError, Keypair};
use ember_types::{Address, Bytes, Hash, RecoverableSignature, U256};
use serde::{Deserialize, Serialize};

/// An unsigned transaction payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender nonce the transaction is bound to.
    pub nonce: u64,
    /// Price per unit of gas, in wei.
    pub gas_price: U256,
    /// Gas budget, intrinsic cost included.
    pub gas_limit: u64,
    /// Recipient; `None` creates a contract.
    pub to: Option<Address>,
    /// Value transferred to the recipient on success, in wei.
    pub value: U256,
    /// Calldata, or init code for a creation.
    pub data: Bytes,
}

impl Transaction {
    /// True if this transaction creates a contract.
    #[must_use]
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }

    /// The digest the sender signs: Keccak-256 over a fixed-layout encoding
    /// of every unsigned field.
    ///
    /// The layout (big-endian integers, length-prefixed data, a tag byte
    /// for the optional recipient) is injective over the field tuple, which
    /// is all signing needs; RLP fidelity is out of scope.
    #[must_use]
    pub fn signing_hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(120 + self.data.len());
        buf.extend_from_slice(&self.nonce.to_be_bytes());

        let mut word = [0u8; 32];
        self.gas_price.to_big_endian(&mut word);
        buf.extend_from_slice(&word);

        buf.extend_from_slice(&self.gas_limit.to_be_bytes());

        match self.to {
            Some(address) => {
                buf.push(1);
                buf.extend_from_slice(address.as_bytes());
            }
            None => buf.push(0),
        }

        self.value.to_big_endian(&mut word);
        buf.extend_from_slice(&word);

        buf.extend_from_slice(&(self.data.len() as u64).to_be_bytes());
        buf.extend_from_slice(self.data.as_slice());

        keccak256(&buf)
    }

    /// Signs the transaction, binding the sender's identity to it.
    ///
    /// # Errors
    ///
    /// Propagates signing failures from the keypair.
    pub fn sign(self, keypair: &Keypair) -> Result<SignedTransaction, CryptoError> {
        let signature = keypair.sign_hash(&self.signing_hash())?;
        Ok(SignedTransaction {
            payload: self,
            signature,
        })
    }
}

/// A signed transaction, ready to be applied exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signed payload.
    pub payload: Transaction,
    /// Recoverable signature over [`Transaction::signing_hash`].
    pub signature: RecoverableSignature,
}

impl SignedTransaction {
    /// Recovers the sender address from the signature.
    ///
    /// # Errors
    ///
    /// Fails if the signature is malformed or recovery fails.
    pub fn recover_sender(&self) -> Result<Address, CryptoError> {
        recover_address(&self.payload.signing_hash(), &self.signature)
    }

    /// Transaction id: Keccak-256 over the signing hash and the signature.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(97);
        buf.extend_from_slice(self.payload.signing_hash().as_bytes());
        buf.extend_from_slice(&self.signature.to_bytes());
        keccak256(&buf)
    }
}

// =============================================================================
// TESTS
// =============================================================================
