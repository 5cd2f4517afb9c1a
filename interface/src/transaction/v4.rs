use crate::common::{AccountId32, Address, AddressType, Balance, Era, Extra, KeyringPair, MultiSignature};
use crate::{blake2b, Error, Result};
use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input};

pub const TX_VERSION: u8 = 4;

/// Version byte of signed transactions, the first bit marks the signature.
const SIGNED: u8 = 0b1000_0000 | TX_VERSION;

/// The signature section of a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signer: Address,
    pub signature: MultiSignature,
    pub extra: Extra,
}

/// A transaction that can contain a signature. Referred to as
/// "UncheckedExtrinsic" in Substrate vocabulary. The call is kept in its
/// encoded form, `[module index][method index][arguments]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signature: Option<Signature>,
    pub call: Vec<u8>,
}

impl Transaction {
    pub fn new_unsigned(call: Vec<u8>) -> Self {
        Self {
            signature: None,
            call,
        }
    }
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
    /// The hash under which the network knows the transaction.
    pub fn hash(&self) -> [u8; 32] {
        blake2b(&self.encode())
    }
    /// `0x` prefixed hex of the encoded transaction, as expected by
    /// `author_submitExtrinsic`.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }
    /// Decodes a transaction. The address encoding can't be told apart from
    /// the bytes alone, it must match the chain.
    pub fn decode_as<I: Input>(
        address_type: AddressType,
        input: &mut I,
    ) -> std::result::Result<Self, ScaleError> {
        // Allocates as the input is read, never more than it holds.
        let body = Vec::<u8>::decode(input)?;

        let mut body = body.as_slice();
        let signature = match body.read_byte()? {
            SIGNED => Some(Signature {
                signer: Address::decode_as(address_type, &mut body)?,
                signature: Decode::decode(&mut body)?,
                extra: Decode::decode(&mut body)?,
            }),
            TX_VERSION => None,
            _ => return Err("Invalid transaction version".into()),
        };

        Ok(Self {
            signature,
            call: body.to_vec(),
        })
    }
}

impl Encode for Transaction {
    fn using_encoded<R, F: FnOnce(&[u8]) -> R>(&self, f: F) -> R {
        let mut enc: Vec<u8> = Vec::with_capacity(self.call.len() + 128);

        match &self.signature {
            Some(sig) => {
                enc.push(SIGNED);
                sig.signer.encode_to(&mut enc);
                sig.signature.encode_to(&mut enc);
                sig.extra.encode_to(&mut enc);
            }
            None => {
                enc.push(TX_VERSION);
            }
        }

        enc.extend_from_slice(&self.call);

        // Prefixed with the compact length, like a `Vec<u8>`.
        f(&enc.encode())
    }
}

/// The signed extensions which are not part of the transaction itself, but
/// of the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ExtraSignaturePayload {
    pub spec_version: u32,
    pub tx_version: u32,
    pub genesis: [u8; 32],
    /// The block hash from where the period of mortality begins. If the
    /// transaction is immortal, it's the genesis hash. See [Era] for more
    /// information.
    pub birth: [u8; 32],
}

/// The payload which gets signed, `call ++ extra ++ additional`. Payloads
/// larger than 256 bytes are hashed first.
pub struct SignaturePayload<'a> {
    pub call: &'a [u8],
    pub extra: &'a Extra,
    pub additional: &'a ExtraSignaturePayload,
}

impl<'a> Encode for SignaturePayload<'a> {
    fn using_encoded<R, F: FnOnce(&[u8]) -> R>(&self, f: F) -> R {
        let mut payload = self.call.to_vec();
        self.extra.encode_to(&mut payload);
        self.additional.encode_to(&mut payload);

        if payload.len() > 256 {
            f(&blake2b(&payload))
        } else {
            f(&payload)
        }
    }
}

/// Builder type for creating signed transactions.
///
/// # Example
///
/// ```
/// use sublink_interface::common::*;
/// use sublink_interface::transaction::*;
///
/// // In this example, a random key is generated. You probably want to *import* one.
/// let keypair = KeyringPair::generate(CryptoType::Sr25519).unwrap();
///
/// // `Balances.transfer_keep_alive`, already encoded.
/// let call = hex::decode("0403ff...").unwrap_or_default();
///
/// let transaction = SignedTransactionBuilder::new()
///     .signer(&keypair)
///     .call(call)
///     .nonce(0)
///     .spec_version(9080)
///     .tx_version(7)
///     .genesis([0; 32])
///     .build()
///     .unwrap();
///
/// assert!(transaction.is_signed());
/// ```
pub struct SignedTransactionBuilder<'a> {
    signer: Option<&'a KeyringPair>,
    call: Option<Vec<u8>>,
    nonce: Option<u32>,
    tip: Balance,
    era: Era,
    address_type: AddressType,
    spec_version: Option<u32>,
    tx_version: Option<u32>,
    genesis: Option<[u8; 32]>,
    birth: Option<[u8; 32]>,
}

impl<'a> Default for SignedTransactionBuilder<'a> {
    fn default() -> Self {
        Self {
            signer: None,
            call: None,
            nonce: None,
            tip: 0,
            era: Era::Immortal,
            address_type: AddressType::default(),
            spec_version: None,
            tx_version: None,
            genesis: None,
            birth: None,
        }
    }
}

impl<'a> SignedTransactionBuilder<'a> {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn signer(self, signer: &'a KeyringPair) -> Self {
        Self {
            signer: Some(signer),
            ..self
        }
    }
    /// Set the encoded call, including the call index.
    pub fn call(self, call: Vec<u8>) -> Self {
        Self {
            call: Some(call),
            ..self
        }
    }
    /// Set the nonce of the transaction. Keep pending transactions of the
    /// same signer in mind.
    pub fn nonce(self, nonce: u32) -> Self {
        Self {
            nonce: Some(nonce),
            ..self
        }
    }
    /// Tip for the block author, zero by default.
    pub fn tip(self, tip: Balance) -> Self {
        Self { tip, ..self }
    }
    /// Set the era of the transaction. Immortal by default. Mortal eras
    /// require the hash of the birth block.
    pub fn era(self, era: Era) -> Self {
        Self { era, ..self }
    }
    pub fn address_type(self, address_type: AddressType) -> Self {
        Self {
            address_type,
            ..self
        }
    }
    pub fn spec_version(self, version: u32) -> Self {
        Self {
            spec_version: Some(version),
            ..self
        }
    }
    pub fn tx_version(self, version: u32) -> Self {
        Self {
            tx_version: Some(version),
            ..self
        }
    }
    pub fn genesis(self, genesis: [u8; 32]) -> Self {
        Self {
            genesis: Some(genesis),
            ..self
        }
    }
    /// The hash of the block where the mortal era begins.
    pub fn birth(self, birth: [u8; 32]) -> Self {
        Self {
            birth: Some(birth),
            ..self
        }
    }
    pub fn build(self) -> Result<Transaction> {
        let signer = self.signer.ok_or(Error::BuilderMissingField("signer"))?;
        let call = self.call.ok_or(Error::BuilderMissingField("call"))?;
        let nonce = self.nonce.ok_or(Error::BuilderMissingField("nonce"))?;
        let spec_version = self
            .spec_version
            .ok_or(Error::BuilderMissingField("spec_version"))?;
        let tx_version = self
            .tx_version
            .ok_or(Error::BuilderMissingField("tx_version"))?;
        let genesis = self.genesis.ok_or(Error::BuilderMissingField("genesis"))?;

        // Set mortality starting period.
        let birth = match self.era {
            Era::Immortal => genesis,
            Era::Mortal(_, _) => self.birth.ok_or(Error::BuilderMissingField("birth"))?,
        };

        let extra = Extra::new(self.era, nonce, self.tip);
        let additional = ExtraSignaturePayload {
            spec_version,
            tx_version,
            genesis,
            birth,
        };

        let payload = SignaturePayload {
            call: &call,
            extra: &extra,
            additional: &additional,
        };

        let signature = payload.using_encoded(|payload| signer.sign(payload));
        let signer = Address::new(self.address_type, AccountId32(signer.public()));

        Ok(Transaction {
            signature: Some(Signature {
                signer,
                signature,
                extra,
            }),
            call,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{verify, CryptoType};
    use test_case::test_case;

    fn keypair() -> KeyringPair {
        KeyringPair::from_seed(CryptoType::Sr25519, &[1; 32]).unwrap()
    }

    fn builder(keypair: &KeyringPair, call: Vec<u8>) -> SignedTransactionBuilder {
        SignedTransactionBuilder::new()
            .signer(keypair)
            .call(call)
            .nonce(5)
            .spec_version(46)
            .tx_version(1)
            .genesis([9; 32])
    }

    #[test]
    fn length_prefix_beyond_input() {
        // Claims u32::MAX bytes, holds four.
        let mut raw = parity_scale_codec::Compact(u32::MAX).encode();
        raw.extend_from_slice(&[4, 4, 0, 1]);

        assert!(Transaction::decode_as(AddressType::MultiAddress, &mut raw.as_slice()).is_err());
    }

    #[test]
    fn unsigned_transaction_encode_decode() {
        let transaction = Transaction::new_unsigned(vec![4, 0, 1, 2, 3]);

        let encoded = transaction.encode();
        // compact length, version, call
        assert_eq!(encoded, vec![6 << 2, 4, 4, 0, 1, 2, 3]);

        let decoded =
            Transaction::decode_as(AddressType::MultiAddress, &mut encoded.as_slice()).unwrap();
        assert_eq!(transaction, decoded);
    }

    #[test_case(AddressType::AccountId, 0xff; "account id")]
    #[test_case(AddressType::MultiAddress, 0x00; "multi address")]
    fn signed_transaction_encode_decode(address_type: AddressType, address_prefix: u8) {
        let keypair = keypair();
        let transaction = builder(&keypair, vec![4, 3, 1, 2])
            .address_type(address_type)
            .build()
            .unwrap();

        let encoded = transaction.encode();
        let mut body = &encoded[2..];
        assert_eq!(body[0], 0x84);
        assert_eq!(body[1], address_prefix);

        let decoded = Transaction::decode_as(address_type, &mut encoded.as_slice()).unwrap();
        assert_eq!(transaction, decoded);

        // Era, nonce and tip.
        body = &body[1 + 33 + 65..];
        assert_eq!(&body[..3], &[0, 5 << 2, 0]);
    }

    #[test]
    fn signature_covers_call_and_extra() {
        let keypair = keypair();
        let call = vec![4, 3, 1, 2];
        let transaction = builder(&keypair, call.clone()).build().unwrap();
        let sig = transaction.signature.as_ref().unwrap();

        let additional = ExtraSignaturePayload {
            spec_version: 46,
            tx_version: 1,
            genesis: [9; 32],
            birth: [9; 32],
        };
        let payload = SignaturePayload {
            call: &call,
            extra: &sig.extra,
            additional: &additional,
        }
        .encode();

        assert!(verify(&payload, &sig.signature, &keypair.public()));
    }

    #[test]
    fn large_payloads_are_hashed() {
        let extra = Extra::new(Era::Immortal, 0, 0);
        let additional = ExtraSignaturePayload {
            spec_version: 1,
            tx_version: 1,
            genesis: [0; 32],
            birth: [0; 32],
        };

        let small = SignaturePayload {
            call: &[0; 10],
            extra: &extra,
            additional: &additional,
        }
        .encode();
        assert_eq!(small.len(), 10 + 3 + 72);

        let large = SignaturePayload {
            call: &[0; 300],
            extra: &extra,
            additional: &additional,
        }
        .encode();
        assert_eq!(large.len(), 32);
    }

    #[test]
    fn builder_missing_fields() {
        let keypair = keypair();

        assert!(matches!(
            SignedTransactionBuilder::new().signer(&keypair).build(),
            Err(Error::BuilderMissingField("call"))
        ));
        assert!(matches!(
            builder(&keypair, vec![0, 0]).era(Era::mortal(64, 100)).build(),
            Err(Error::BuilderMissingField("birth"))
        ));

        let mortal = builder(&keypair, vec![0, 0])
            .era(Era::mortal(64, 100))
            .birth([1; 32])
            .build()
            .unwrap();
        assert_eq!(
            mortal.signature.unwrap().extra.era,
            Era::Mortal(64, 100 % 64)
        );
    }

    #[test]
    fn invalid_version_byte() {
        let encoded = vec![2 << 2, 0x05, 0x00];
        assert!(Transaction::decode_as(AddressType::AccountId, &mut encoded.as_slice()).is_err());
    }
}
