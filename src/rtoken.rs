//! Storage queries and event data of the stafi rtoken modules, and the
//! staking queries the rtoken relays depend on.

use crate::client::Client;
use crate::model::{ChainEvent, EventParam};
use crate::{Error, Result};
use parity_scale_codec::{Decode, Encode};
use std::convert::TryFrom;
use std::fmt;
use sublink_interface::common::AccountId32;
use sublink_rpc::ConnectionFactory;
use sublink_types::Value;

/// Symbol of an rtoken, encoded as its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum RSymbol {
    Rfis,
    Rdot,
    Rksm,
    Ratom,
    Rsol,
    Rmatic,
    Rbnb,
    Reth,
}

const SYMBOLS: [(RSymbol, &str); 8] = [
    (RSymbol::Rfis, "RFIS"),
    (RSymbol::Rdot, "RDOT"),
    (RSymbol::Rksm, "RKSM"),
    (RSymbol::Ratom, "RATOM"),
    (RSymbol::Rsol, "RSOL"),
    (RSymbol::Rmatic, "RMATIC"),
    (RSymbol::Rbnb, "RBNB"),
    (RSymbol::Reth, "RETH"),
];

impl RSymbol {
    pub fn as_str(&self) -> &'static str {
        SYMBOLS
            .iter()
            .find(|(symbol, _)| symbol == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }
    /// Looks up a symbol by its runtime name, such as `RDOT`.
    pub fn from_name(name: &str) -> Option<Self> {
        SYMBOLS
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(symbol, _)| *symbol)
    }
}

impl fmt::Display for RSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockChunk {
    pub value: u128,
    pub era: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingLedger {
    pub stash: AccountId32,
    pub total: u128,
    pub active: u128,
    pub unlocking: Vec<UnlockChunk>,
    pub claimed_rewards: Vec<u32>,
}

impl TryFrom<&Value> for StakingLedger {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        let stash = value.field("stash")?;
        let unlocking = value
            .field("unlocking")?
            .as_sequence()?
            .iter()
            .map(|chunk| -> Result<UnlockChunk> {
                Ok(UnlockChunk {
                    value: chunk.field("value")?.as_u128()?,
                    era: chunk.field("era")?.as_u32()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let claimed_rewards = value
            .field("claimedRewards")?
            .as_sequence()?
            .iter()
            .map(|era| era.as_u32())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(StakingLedger {
            stash: account(stash).ok_or_else(|| Error::UnexpectedValue {
                entry: "Staking.Ledger".to_string(),
                reason: "stash is not an account id".to_string(),
            })?,
            total: value.field("total")?.as_u128()?,
            active: value.field("active")?.as_u128()?,
            unlocking,
            claimed_rewards,
        })
    }
}

impl<F: ConnectionFactory> Client<F> {
    /// Reads a value which must be stored, absent values are an error.
    async fn stored(&self, prefix: &str, entry: &str, keys: &[&[u8]]) -> Result<Value> {
        self.query_stored(prefix, entry, keys, None)
            .await?
            .ok_or_else(|| Error::StorageNotFound(format!("{}.{}", prefix, entry)))
    }
    /// The era of the rtoken's chain as last reported by the relays.
    pub async fn current_chain_era(&self, symbol: RSymbol) -> Result<u32> {
        Ok(self
            .stored("RTokenLedger", "ChainEras", &[&symbol.encode()])
            .await?
            .as_u32()?)
    }
    /// Limit of the active rate change, in parts per billion.
    pub async fn active_change_rate_limit(&self, symbol: RSymbol) -> Result<u32> {
        Ok(self
            .stored("RTokenLedger", "ActiveChangeRateLimit", &[&symbol.encode()])
            .await?
            .as_u32()?)
    }
    pub async fn rtoken_total_issuance(&self, symbol: RSymbol) -> Result<u128> {
        Ok(self
            .stored("RBalances", "TotalIssuance", &[&symbol.encode()])
            .await?
            .as_u128()?)
    }
    /// Ids of the snapshots of the current era.
    pub async fn current_era_snapshots(&self, symbol: RSymbol) -> Result<Vec<[u8; 32]>> {
        self.stored("RTokenLedger", "CurrentEraSnapShots", &[&symbol.encode()])
            .await?
            .as_sequence()?
            .iter()
            .map(|id| {
                hash(id).ok_or_else(|| Error::UnexpectedValue {
                    entry: "RTokenLedger.CurrentEraSnapShots".to_string(),
                    reason: "snapshot id is not a 32 byte hash".to_string(),
                })
            })
            .collect()
    }
    /// Exchange rate of the rtoken in the given era.
    pub async fn era_rate(&self, symbol: RSymbol, era: u32) -> Result<u64> {
        Ok(self
            .stored("RTokenRate", "EraRate", &[&symbol.encode(), &era.encode()])
            .await?
            .as_u64()?)
    }
    /// Account receiving the rtoken bonds.
    pub async fn rtoken_receiver(&self) -> Result<AccountId32> {
        let value = self.stored("RTokenLedger", "Receiver", &[]).await?;

        account(&value).ok_or_else(|| Error::UnexpectedValue {
            entry: "RTokenLedger.Receiver".to_string(),
            reason: "not an account id".to_string(),
        })
    }
    /// Whether a mint with this transaction hash was claimed already.
    pub async fn mint_tx_hash_exist(&self, tx_hash: &[u8]) -> Result<bool> {
        match self
            .query_stored("RClaim", "MintTxHashExist", &[&tx_hash.encode()], None)
            .await?
        {
            Some(exists) => Ok(exists.as_bool()?),
            None => Ok(false),
        }
    }
    pub async fn staking_ledger(&self, controller: &AccountId32) -> Result<StakingLedger> {
        let ledger = self
            .stored("Staking", "Ledger", &[controller.as_ref()])
            .await?;

        StakingLedger::try_from(&ledger)
    }
    /// Index of the active staking era.
    pub async fn current_era(&self) -> Result<u32> {
        Ok(self
            .stored("Staking", "ActiveEra", &[])
            .await?
            .field("index")?
            .as_u32()?)
    }
}

fn account(value: &Value) -> Option<AccountId32> {
    hash(value).map(AccountId32)
}

fn hash(value: &Value) -> Option<[u8; 32]> {
    <[u8; 32]>::try_from(value.as_bytes().ok()?).ok()
}

/// Block and extrinsic a multisig operation started at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timepoint {
    pub height: u32,
    pub index: u32,
}

/// `RBalances.Transfer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTokenTransfer {
    pub from: AccountId32,
    pub to: AccountId32,
    pub symbol: RSymbol,
    pub value: u128,
}

/// `RDexSwap.Swap`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdexSwap {
    pub from: AccountId32,
    pub symbol: RSymbol,
    pub input_amount: u128,
    pub output_amount: u128,
    pub fee_amount: u128,
    pub input_is_fis: bool,
    pub fis_balance: u128,
    pub rtoken_balance: u128,
}

/// `RDexSwap.AddLiquidity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdexAddLiquidity {
    pub from: AccountId32,
    pub symbol: RSymbol,
    pub fis_amount: u128,
    pub rtoken_amount: u128,
    pub new_total_unit: u128,
    pub add_unit: u128,
    pub fis_balance: u128,
    pub rtoken_balance: u128,
}

/// `RDexSwap.RemoveLiquidity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdexRemoveLiquidity {
    pub from: AccountId32,
    pub symbol: RSymbol,
    pub remove_unit: u128,
    pub swap_unit: u128,
    pub remove_fis_amount: u128,
    pub remove_rtoken_amount: u128,
    pub input_is_fis: bool,
    pub fis_balance: u128,
    pub rtoken_balance: u128,
}

/// `Multisig.NewMultisig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMultisig {
    pub who: AccountId32,
    pub id: AccountId32,
    pub call_hash: [u8; 32],
}

/// `Multisig.MultisigExecuted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigExecuted {
    pub who: AccountId32,
    pub timepoint: Timepoint,
    pub id: AccountId32,
    pub call_hash: [u8; 32],
    /// Whether the call dispatched successfully.
    pub ok: bool,
}

/// Parameters of an event, checked for its name and their count.
struct Params<'a> {
    event: String,
    params: &'a [EventParam],
}

impl<'a> Params<'a> {
    fn of(event: &'a ChainEvent, module: &str, name: &str, count: usize) -> Result<Self> {
        let full = format!("{}.{}", module, name);

        if event.module != module || event.event != name {
            return Err(Error::EventData {
                reason: format!("got {}.{}", event.module, event.event),
                event: full,
            });
        }
        if event.params.len() != count {
            return Err(Error::EventData {
                reason: format!("{} params expected, got {}", count, event.params.len()),
                event: full,
            });
        }

        Ok(Params {
            event: full,
            params: &event.params,
        })
    }
    fn invalid(&self, index: usize, what: &str) -> Error {
        Error::EventData {
            event: self.event.clone(),
            reason: format!("param {} is not {}", index, what),
        }
    }
    fn value(&self, index: usize) -> Result<&'a Value> {
        self.params
            .get(index)
            .map(|param| &param.value)
            .ok_or_else(|| self.invalid(index, "present"))
    }
    fn account(&self, index: usize) -> Result<AccountId32> {
        account(self.value(index)?).ok_or_else(|| self.invalid(index, "an account id"))
    }
    fn hash(&self, index: usize) -> Result<[u8; 32]> {
        hash(self.value(index)?).ok_or_else(|| self.invalid(index, "a 32 byte hash"))
    }
    fn symbol(&self, index: usize) -> Result<RSymbol> {
        self.value(index)?
            .as_variant()
            .ok()
            .and_then(|(name, _)| RSymbol::from_name(name))
            .ok_or_else(|| self.invalid(index, "an rtoken symbol"))
    }
    fn balance(&self, index: usize) -> Result<u128> {
        self.value(index)?
            .as_u128()
            .map_err(|_| self.invalid(index, "an integer"))
    }
    fn flag(&self, index: usize) -> Result<bool> {
        self.value(index)?
            .as_bool()
            .map_err(|_| self.invalid(index, "a bool"))
    }
    fn timepoint(&self, index: usize) -> Result<Timepoint> {
        let value = self.value(index)?;
        let field = |name: &str| value.field(name).and_then(|field| field.as_u32());

        match (field("height"), field("index")) {
            (Ok(height), Ok(extrinsic)) => Ok(Timepoint {
                height,
                index: extrinsic,
            }),
            _ => Err(self.invalid(index, "a timepoint")),
        }
    }
    fn dispatch_ok(&self, index: usize) -> Result<bool> {
        match self.value(index)?.as_variant() {
            Ok((name, _)) => Ok(name == "Ok"),
            Err(_) => Err(self.invalid(index, "a dispatch result")),
        }
    }
}

impl TryFrom<&ChainEvent> for RTokenTransfer {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "RBalances", "Transfer", 4)?;

        Ok(RTokenTransfer {
            from: params.account(0)?,
            to: params.account(1)?,
            symbol: params.symbol(2)?,
            value: params.balance(3)?,
        })
    }
}

impl TryFrom<&ChainEvent> for RdexSwap {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "RDexSwap", "Swap", 8)?;

        Ok(RdexSwap {
            from: params.account(0)?,
            symbol: params.symbol(1)?,
            input_amount: params.balance(2)?,
            output_amount: params.balance(3)?,
            fee_amount: params.balance(4)?,
            input_is_fis: params.flag(5)?,
            fis_balance: params.balance(6)?,
            rtoken_balance: params.balance(7)?,
        })
    }
}

impl TryFrom<&ChainEvent> for RdexAddLiquidity {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "RDexSwap", "AddLiquidity", 8)?;

        Ok(RdexAddLiquidity {
            from: params.account(0)?,
            symbol: params.symbol(1)?,
            fis_amount: params.balance(2)?,
            rtoken_amount: params.balance(3)?,
            new_total_unit: params.balance(4)?,
            add_unit: params.balance(5)?,
            fis_balance: params.balance(6)?,
            rtoken_balance: params.balance(7)?,
        })
    }
}

impl TryFrom<&ChainEvent> for RdexRemoveLiquidity {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "RDexSwap", "RemoveLiquidity", 9)?;

        Ok(RdexRemoveLiquidity {
            from: params.account(0)?,
            symbol: params.symbol(1)?,
            remove_unit: params.balance(2)?,
            swap_unit: params.balance(3)?,
            remove_fis_amount: params.balance(4)?,
            remove_rtoken_amount: params.balance(5)?,
            input_is_fis: params.flag(6)?,
            fis_balance: params.balance(7)?,
            rtoken_balance: params.balance(8)?,
        })
    }
}

impl TryFrom<&ChainEvent> for NewMultisig {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "Multisig", "NewMultisig", 3)?;

        Ok(NewMultisig {
            who: params.account(0)?,
            id: params.account(1)?,
            call_hash: params.hash(2)?,
        })
    }
}

impl TryFrom<&ChainEvent> for MultisigExecuted {
    type Error = Error;

    fn try_from(event: &ChainEvent) -> Result<Self> {
        let params = Params::of(event, "Multisig", "MultisigExecuted", 5)?;

        Ok(MultisigExecuted {
            who: params.account(0)?,
            timepoint: params.timepoint(1)?,
            id: params.account(2)?,
            call_hash: params.hash(3)?,
            ok: params.dispatch_ok(4)?,
        })
    }
}
