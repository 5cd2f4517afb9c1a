//! Signed and unsigned transactions to be submitted to the network.
//!
//! The easiest way to create transactions is to use the
//! [`SignedTransactionBuilder`] type.

// Re-export the latest version.
pub use v4::{
    ExtraSignaturePayload, Signature, SignaturePayload, SignedTransactionBuilder, Transaction,
};

// Version 4 of the transaction format.
pub mod v4;
