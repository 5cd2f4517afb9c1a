// # COPYRIGHT DISCLAIMER
//
// Large part of the code visible in this file was copied from the
// [Substrate](https://github.com/paritytech/substrate) project, developed by
// [Parity Technologies](https://www.parity.io/) and licensed under the [Apache
// License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0). The copied
// work was modified by the author of this library. The author of this library
// takes no credit for the copied work and fully complies with the Apache
// License, Version 2.0.
//
// # LICENSE OF THE COPIED WORK
//
// This file is part of Substrate.

// Copyright (C) 2017-2021 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{Error, Result};
use base58::{FromBase58, ToBase58};
use blake2_rfc::blake2b::Blake2b;

const CHECKSUM_LEN: usize = 2;
const PREFIX: &[u8] = b"SS58PRE";

pub trait Ss58Codec: Sized + AsMut<[u8]> + AsRef<[u8]> + Default {
    /// Converts the SS58 encoded string into the key and returns it.
    fn from_ss58(s: &str) -> Result<Self> {
        Self::from_ss58_with_format(s).map(|(r, _)| r)
    }
    /// Converts the SS58 encoded string into the key. Returns the key and the
    /// identified address format.
    fn from_ss58_with_format(s: &str) -> Result<(Self, Ss58AddressFormat)> {
        let mut res = Self::default();

        // Must decode to our type.
        let body_len = res.as_mut().len();

        let data = s
            .from_base58()
            .map_err(|_| Error::InvalidSs58("not valid base58"))?;
        if data.len() < 2 {
            return Err(Error::InvalidSs58("too short"));
        }

        let (prefix_len, ident) = match data[0] {
            0..=63 => (1, data[0] as u16),
            64..=127 => {
                // d[0] d[1] are: 01aaaaaa bbcccccc
                // they make the LE-encoded 16-bit value: aaaaaabb 00cccccc
                let lower = (data[0] << 2) | (data[1] >> 6);
                let upper = data[1] & 0b00111111;
                (2, (lower as u16) | ((upper as u16) << 8))
            }
            _ => return Err(Error::InvalidSs58("reserved prefix")),
        };

        if data.len() != prefix_len + body_len + CHECKSUM_LEN {
            return Err(Error::InvalidSs58("invalid length"));
        }

        let hash = ss58hash(&data[0..body_len + prefix_len]);
        let checksum = &hash.as_bytes()[0..CHECKSUM_LEN];
        if data[body_len + prefix_len..body_len + prefix_len + CHECKSUM_LEN] != *checksum {
            return Err(Error::InvalidSs58("invalid checksum"));
        }

        res.as_mut()
            .copy_from_slice(&data[prefix_len..body_len + prefix_len]);
        Ok((res, ident.into()))
    }
    /// Returns the SS58 encoded string of the key.
    fn to_ss58(&self, format: Ss58AddressFormat) -> String {
        // SS58 prefixes are limited to 14 bits.
        let ident: u16 = u16::from(format) & 0b0011_1111_1111_1111;
        let mut v = if ident <= 63 {
            vec![ident as u8]
        } else {
            // upper six bits of the lower byte(!)
            let first = ((ident & 0b0000_0000_1111_1100) as u8) >> 2;
            // lower two bits of the lower byte in the high pos,
            // lower bits of the upper byte in the low pos
            let second = ((ident >> 8) as u8) | ((ident & 0b0000_0000_0000_0011) as u8) << 6;
            vec![first | 0b01000000, second]
        };
        v.extend(self.as_ref());
        let r = ss58hash(&v);
        v.extend(&r.as_bytes()[0..CHECKSUM_LEN]);
        v.to_base58()
    }
}

impl Ss58Codec for [u8; 32] {}

fn ss58hash(data: &[u8]) -> blake2_rfc::blake2b::Blake2bResult {
    let mut context = Blake2b::new(64);
    context.update(PREFIX);
    context.update(data);
    context.finalize()
}

macro_rules! ss58_address_format {
    ( $( $identifier:tt => ($number:expr, $name:expr) )* ) => (
        /// A known address format/network ID for SS58.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Ss58AddressFormat {
            $($identifier),*,
            /// Use a manually provided numeric value as a standard identifier
            Custom(u16),
        }

        impl From<Ss58AddressFormat> for u16 {
            fn from(x: Ss58AddressFormat) -> u16 {
                match x {
                    $(Ss58AddressFormat::$identifier => $number),*,
                    Ss58AddressFormat::Custom(n) => n,
                }
            }
        }

        impl From<u16> for Ss58AddressFormat {
            fn from(x: u16) -> Ss58AddressFormat {
                match x {
                    $($number => Ss58AddressFormat::$identifier),*,
                    _ => Ss58AddressFormat::Custom(x),
                }
            }
        }

        impl std::fmt::Display for Ss58AddressFormat {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                match self {
                    $(
                        Ss58AddressFormat::$identifier => write!(f, "{}", $name),
                    )*
                    Ss58AddressFormat::Custom(x) => write!(f, "{}", x),
                }
            }
        }
    )
}

ss58_address_format!(
    PolkadotAccount => (0, "polkadot")
    KusamaAccount => (2, "kusama")
    StafiAccount => (20, "stafi")
    SubstrateAccount => (42, "substrate")
);
