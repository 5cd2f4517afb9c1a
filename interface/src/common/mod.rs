use self::ss58format::{Ss58AddressFormat, Ss58Codec};
use crate::{Error, Result};
use ed25519_dalek::{Keypair as EdKeypair, Signer, Verifier};
use parity_scale_codec::{Compact, Decode, Encode, Error as ScaleError, Input, Output};
use schnorrkel::keys::Keypair as SrKeypair;
use schnorrkel::{signing_context, ExpansionMode, MiniSecretKey};
use std::convert::TryFrom;
use std::fmt;

pub mod ss58format;

/// Re-export of the [`parity-scale-codec`](https://crates.io/crates/parity-scale-codec) crate.
pub mod scale {
    pub use parity_scale_codec::*;
}

pub type Balance = u128;

/// Signing context of sr25519 signatures on Substrate chains.
const SIGNING_CTX: &[u8] = b"substrate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
pub struct AccountId32(pub [u8; 32]);

impl AccountId32 {
    pub fn from_ss58_address(address: &str) -> Result<Self> {
        <[u8; 32]>::from_ss58(address).map(AccountId32)
    }
    pub fn to_ss58_address(&self, format: Ss58AddressFormat) -> String {
        self.0.to_ss58(format)
    }
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for AccountId32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for AccountId32 {
    fn from(val: [u8; 32]) -> Self {
        AccountId32(val)
    }
}

impl fmt::Display for AccountId32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// How the signer is encoded within an extrinsic. Fixed per chain, older
/// runtimes use the plain account id, newer ones `MultiAddress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    AccountId,
    MultiAddress,
}

impl Default for AddressType {
    fn default() -> Self {
        AddressType::MultiAddress
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum MultiAddress {
    Id(AccountId32),
    Index(#[codec(compact)] u32),
    Raw(Vec<u8>),
    Address32([u8; 32]),
    Address20([u8; 20]),
}

/// The signer of an extrinsic, encoded according to the [`AddressType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Encoded as `0xff` followed by the account id.
    AccountId(AccountId32),
    Multi(MultiAddress),
}

impl Address {
    pub fn new(ty: AddressType, account: AccountId32) -> Self {
        match ty {
            AddressType::AccountId => Address::AccountId(account),
            AddressType::MultiAddress => Address::Multi(MultiAddress::Id(account)),
        }
    }
    pub fn address_type(&self) -> AddressType {
        match self {
            Address::AccountId(_) => AddressType::AccountId,
            Address::Multi(_) => AddressType::MultiAddress,
        }
    }
    pub fn account_id(&self) -> Option<&AccountId32> {
        match self {
            Address::AccountId(account) | Address::Multi(MultiAddress::Id(account)) => {
                Some(account)
            }
            _ => None,
        }
    }
    pub fn decode_as<I: Input>(
        ty: AddressType,
        input: &mut I,
    ) -> std::result::Result<Self, ScaleError> {
        match ty {
            AddressType::AccountId => match input.read_byte()? {
                0xff => Ok(Address::AccountId(Decode::decode(input)?)),
                _ => Err("account index addresses are not supported".into()),
            },
            AddressType::MultiAddress => Ok(Address::Multi(Decode::decode(input)?)),
        }
    }
}

impl Encode for Address {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        match self {
            Address::AccountId(account) => {
                dest.push_byte(0xff);
                account.encode_to(dest);
            }
            Address::Multi(address) => address.encode_to(dest),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum MultiSignature {
    Ed25519([u8; 64]),
    Sr25519([u8; 64]),
    Ecdsa([u8; 65]),
}

/// The validity period of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Immortal,
    /// Period (a power of two, 4 to 65536) and phase.
    Mortal(u64, u64),
}

impl Era {
    /// Creates a mortal era valid for about `period` blocks starting at
    /// `current`.
    pub fn mortal(period: u64, current: u64) -> Self {
        let period = period.checked_next_power_of_two().unwrap_or(1 << 16);
        let period = period.max(4).min(1 << 16);
        let phase = current % period;
        let quantize_factor = (period >> 12).max(1);
        let quantized_phase = phase / quantize_factor * quantize_factor;

        Era::Mortal(period, quantized_phase)
    }
    pub fn is_immortal(&self) -> bool {
        matches!(self, Era::Immortal)
    }
    /// The first block number of the validity period, as seen from
    /// `current`. The hash of that block is part of the signature payload.
    pub fn birth(&self, current: u64) -> u64 {
        match self {
            Era::Immortal => 0,
            Era::Mortal(period, phase) => (current.max(*phase) - phase) / period * period + phase,
        }
    }
}

impl Default for Era {
    fn default() -> Self {
        Era::Immortal
    }
}

impl Encode for Era {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        match self {
            Era::Immortal => dest.push_byte(0),
            Era::Mortal(period, phase) => {
                let quantize_factor = (*period >> 12).max(1);
                let encoded = period.trailing_zeros().saturating_sub(1).max(1).min(15) as u16
                    | ((phase / quantize_factor) << 4) as u16;
                encoded.encode_to(dest);
            }
        }
    }
}

impl Decode for Era {
    fn decode<I: Input>(input: &mut I) -> std::result::Result<Self, ScaleError> {
        let first = input.read_byte()?;
        if first == 0 {
            return Ok(Era::Immortal);
        }

        let encoded = first as u64 + ((input.read_byte()? as u64) << 8);
        let period = 2 << (encoded % (1 << 4));
        let quantize_factor = (period >> 12).max(1);
        let phase = (encoded >> 4) * quantize_factor;

        if period >= 4 && phase < period {
            Ok(Era::Mortal(period, phase))
        } else {
            Err("invalid period and phase".into())
        }
    }
}

/// The extra fields of a signed extrinsic, signed alongside the call.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Extra {
    pub era: Era,
    pub nonce: Compact<u32>,
    pub tip: Compact<Balance>,
}

impl Extra {
    pub fn new(era: Era, nonce: u32, tip: Balance) -> Self {
        Extra {
            era,
            nonce: Compact(nonce),
            tip: Compact(tip),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptoType {
    Sr25519,
    Ed25519,
}

/// A key pair used for signing extrinsics. The secret never leaves this
/// type.
pub enum KeyringPair {
    Sr25519(SrKeypair),
    Ed25519(EdKeypair),
}

impl KeyringPair {
    /// Generates a new key pair from a random seed.
    pub fn generate(crypto: CryptoType) -> Result<Self> {
        let mut seed = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut seed);
        Self::from_seed(crypto, &seed)
    }
    /// Creates the key pair from a 32 byte seed, the same way Substrate
    /// derives it from a raw seed.
    pub fn from_seed(crypto: CryptoType, seed: &[u8]) -> Result<Self> {
        if seed.len() != 32 {
            return Err(Error::InvalidSeed);
        }

        match crypto {
            CryptoType::Sr25519 => {
                let secret = MiniSecretKey::from_bytes(seed).map_err(|_| Error::InvalidSeed)?;
                Ok(KeyringPair::Sr25519(
                    secret.expand_to_keypair(ExpansionMode::Ed25519),
                ))
            }
            CryptoType::Ed25519 => {
                let secret =
                    ed25519_dalek::SecretKey::from_bytes(seed).map_err(|_| Error::InvalidSeed)?;
                let public = ed25519_dalek::PublicKey::from(&secret);
                Ok(KeyringPair::Ed25519(EdKeypair { secret, public }))
            }
        }
    }
    /// Like [`KeyringPair::from_seed`], accepts a hex seed with or without `0x`
    /// prefix.
    pub fn from_seed_hex(crypto: CryptoType, seed: &str) -> Result<Self> {
        let seed = seed.trim_start_matches("0x");
        let seed = hex::decode(seed).map_err(|_| Error::InvalidSeed)?;
        Self::from_seed(crypto, &seed)
    }
    pub fn crypto_type(&self) -> CryptoType {
        match self {
            KeyringPair::Sr25519(_) => CryptoType::Sr25519,
            KeyringPair::Ed25519(_) => CryptoType::Ed25519,
        }
    }
    pub fn public(&self) -> [u8; 32] {
        match self {
            KeyringPair::Sr25519(pair) => pair.public.to_bytes(),
            KeyringPair::Ed25519(pair) => pair.public.to_bytes(),
        }
    }
    pub fn account_id(&self) -> AccountId32 {
        AccountId32(self.public())
    }
    pub fn ss58_address(&self, format: Ss58AddressFormat) -> String {
        self.account_id().to_ss58_address(format)
    }
    pub fn sign(&self, message: &[u8]) -> MultiSignature {
        match self {
            KeyringPair::Sr25519(pair) => {
                let context = signing_context(SIGNING_CTX);
                MultiSignature::Sr25519(pair.sign(context.bytes(message)).to_bytes())
            }
            KeyringPair::Ed25519(pair) => MultiSignature::Ed25519(pair.sign(message).to_bytes()),
        }
    }
}

impl fmt::Debug for KeyringPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringPair")
            .field("crypto", &self.crypto_type())
            .field("public", &hex::encode(self.public()))
            .finish()
    }
}

/// Verifies the signature of the message against the public key. ECDSA
/// signatures are not supported and never verify.
pub fn verify(message: &[u8], signature: &MultiSignature, public: &[u8; 32]) -> bool {
    match signature {
        MultiSignature::Sr25519(sig) => {
            let public = match schnorrkel::PublicKey::from_bytes(public) {
                Ok(public) => public,
                Err(_) => return false,
            };
            let sig = match schnorrkel::Signature::from_bytes(sig) {
                Ok(sig) => sig,
                Err(_) => return false,
            };

            public.verify_simple(SIGNING_CTX, message, &sig).is_ok()
        }
        MultiSignature::Ed25519(sig) => {
            let public = match ed25519_dalek::PublicKey::from_bytes(public) {
                Ok(public) => public,
                Err(_) => return false,
            };
            let sig = match ed25519_dalek::Signature::try_from(&sig[..]) {
                Ok(sig) => sig,
                Err(_) => return false,
            };

            public.verify(message, &sig).is_ok()
        }
        MultiSignature::Ecdsa(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test_case(CryptoType::Sr25519; "sr25519")]
    #[test_case(CryptoType::Ed25519; "ed25519")]
    fn sign_and_verify(crypto: CryptoType) {
        let pair = KeyringPair::generate(crypto).unwrap();
        let message = b"sublink";
        let signature = pair.sign(message);

        assert!(verify(message, &signature, &pair.public()));
        assert!(!verify(b"other", &signature, &pair.public()));
        assert!(!verify(message, &signature, &[0; 32]));
    }

    #[test]
    fn sr25519_from_known_seed() {
        // Alice
        let pair = KeyringPair::from_seed_hex(
            CryptoType::Sr25519,
            "0xe5be9a5092b81bca64be81d212e7f2f9eba183bb7a90954f7b76361f6edb5c0a",
        )
        .unwrap();

        assert_eq!(
            pair.public(),
            hex!("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d")
        );
        assert_eq!(
            pair.ss58_address(Ss58AddressFormat::SubstrateAccount),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
    }

    #[test]
    fn invalid_seed() {
        assert!(matches!(
            KeyringPair::from_seed(CryptoType::Ed25519, &[1; 31]),
            Err(Error::InvalidSeed)
        ));
        assert!(matches!(
            KeyringPair::from_seed_hex(CryptoType::Sr25519, "0xnothex"),
            Err(Error::InvalidSeed)
        ));
    }

    #[test]
    fn address_encodings() {
        let account = AccountId32([1; 32]);

        let legacy = Address::new(AddressType::AccountId, account).encode();
        assert_eq!(legacy.len(), 33);
        assert_eq!(legacy[0], 0xff);

        let multi = Address::new(AddressType::MultiAddress, account).encode();
        assert_eq!(multi.len(), 33);
        assert_eq!(multi[0], 0x00);

        let decoded = Address::decode_as(AddressType::AccountId, &mut legacy.as_slice()).unwrap();
        assert_eq!(decoded.account_id(), Some(&account));
        let decoded = Address::decode_as(AddressType::MultiAddress, &mut multi.as_slice()).unwrap();
        assert_eq!(decoded.account_id(), Some(&account));
    }

    #[test]
    fn era_encoding() {
        assert_eq!(Era::Immortal.encode(), vec![0]);
        assert_eq!(Era::decode(&mut [0u8].as_ref()).unwrap(), Era::Immortal);

        // Period 64, phase 42, as in the Substrate documentation.
        let era = Era::mortal(64, 42);
        assert_eq!(era, Era::Mortal(64, 42));
        assert_eq!(era.encode(), vec![165, 2]);
        assert_eq!(Era::decode(&mut era.encode().as_slice()).unwrap(), era);

        assert_eq!(era.birth(42), 42);
        assert_eq!(era.birth(100), 42 + 64 * ((100 - 42) / 64));
    }

    #[test]
    fn mortal_era_bounds() {
        assert_eq!(Era::mortal(1, 7), Era::Mortal(4, 3));
        assert_eq!(Era::mortal(100_000, 3), Era::Mortal(65536, 0));
    }
}
