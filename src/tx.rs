//! Signing, submission and the calls the client builds itself.

use crate::client::Client;
use crate::config::EraConfig;
use crate::model::{CallArg, OpaqueCall};
use crate::{Error, Result};
use parity_scale_codec::Encode;
use sublink_interface::common::{AccountId32, AddressType, Era};
use sublink_interface::transaction::{SignedTransactionBuilder, Transaction};
use sublink_rpc::{CancellationToken, ConnectionFactory, ExtrinsicStatus, PaymentQueryInfo};
use sublink_types::Value;

impl<F: ConnectionFactory> Client<F> {
    /// Encodes a `Module.method` call against the latest runtime.
    pub async fn encode_call(&self, call: &str, args: Vec<CallArg>) -> Result<Vec<u8>> {
        let runtime = self.latest_metadata().await?;
        self.dialect.encode_call(&runtime, call, args)
    }
    /// The account as call argument, in the address format of the chain.
    pub fn address_value(&self, account: &AccountId32) -> Value {
        let id = Value::Bytes(account.0.to_vec());

        match self.config.address_type {
            AddressType::AccountId => id,
            AddressType::MultiAddress => Value::variant("Id", id),
        }
    }
    /// Signs the encoded call with the configured signer. Nonce, runtime
    /// versions and the era are fetched from the node.
    pub async fn sign(&self, call: Vec<u8>) -> Result<Transaction> {
        let signer = self.signer.as_ref().ok_or(Error::MissingSigner)?;

        let version = self.rpc.runtime_version(None).await?;
        let nonce = self.nonce(&signer.account_id()).await?;

        let (era, birth) = match self.config.era {
            EraConfig::Immortal => (Era::Immortal, self.genesis),
            EraConfig::Mortal(period) => {
                let current = self.latest_block_number().await?;
                let era = Era::mortal(period, current);
                let birth = self.block_hash(era.birth(current)).await?;

                (era, crate::client::parse_hash(&birth)?)
            }
        };

        debug!(
            "Signing extrinsic with nonce {}, spec version {}, {:?}",
            nonce, version.spec_version, era
        );

        Ok(SignedTransactionBuilder::new()
            .signer(signer)
            .call(call)
            .nonce(nonce)
            .era(era)
            .address_type(self.config.address_type)
            .spec_version(version.spec_version)
            .tx_version(version.transaction_version)
            .genesis(self.genesis)
            .birth(birth)
            .build()?)
    }
    /// Submits the extrinsic and waits until it's included in a block.
    /// Returns the hash of that block.
    pub async fn submit_and_watch(
        &self,
        tx: &Transaction,
        token: &CancellationToken,
    ) -> Result<String> {
        let hash = format!("0x{}", hex::encode(tx.hash()));
        debug!("Submitting extrinsic {}", hash);

        match self.rpc.submit_and_watch(&tx.to_hex(), token).await? {
            ExtrinsicStatus::InBlock(block) | ExtrinsicStatus::Finalized(block) => {
                info!("Extrinsic {} included in block {}", hash, block);
                Ok(block)
            }
            ExtrinsicStatus::Retracted(block) => {
                warn!("Extrinsic {} retracted from block {}", hash, block);
                Err(Error::Retracted(block))
            }
            ExtrinsicStatus::FinalityTimeout(block) => {
                warn!("Extrinsic {} not finalized in block {}", hash, block);
                Err(Error::FinalityTimeout(block))
            }
            ExtrinsicStatus::Usurped(by) => {
                warn!("Extrinsic {} usurped by {}", hash, by);
                Err(Error::Usurped(by))
            }
            ExtrinsicStatus::Dropped => {
                warn!("Extrinsic {} dropped", hash);
                Err(Error::Dropped)
            }
            ExtrinsicStatus::Invalid => {
                warn!("Extrinsic {} invalid", hash);
                Err(Error::Invalid)
            }
            // Not terminal, never returned by the watch.
            ExtrinsicStatus::Future | ExtrinsicStatus::Ready | ExtrinsicStatus::Broadcast(_) => {
                Err(Error::Terminated)
            }
        }
    }
    /// Encodes, signs and submits the call.
    pub async fn sign_and_submit(
        &self,
        call: &str,
        args: Vec<CallArg>,
        token: &CancellationToken,
    ) -> Result<String> {
        let call = self.encode_call(call, args).await?;
        let tx = self.sign(call).await?;
        self.submit_and_watch(&tx, token).await
    }
    /// Estimated fees of the extrinsic.
    pub async fn payment_info(&self, tx: &Transaction) -> Result<PaymentQueryInfo> {
        Ok(self.rpc.query_info(&tx.to_hex(), None).await?)
    }
    pub async fn transfer(
        &self,
        dest: &AccountId32,
        value: u128,
        token: &CancellationToken,
    ) -> Result<String> {
        let args = vec![self.address_value(dest).into(), Value::Integer(value).into()];
        self.sign_and_submit("Balances.transfer_keep_alive", args, token)
            .await
    }
    /// Transfers to many accounts in a single `Utility.batch`.
    pub async fn batch_transfer(
        &self,
        transfers: &[(AccountId32, u128)],
        token: &CancellationToken,
    ) -> Result<String> {
        let mut calls = Vec::with_capacity(transfers.len());
        for (dest, value) in transfers {
            calls.push(self.transfer_call(dest, *value).await?.opaque);
        }

        let batch = self.batch_call(calls).await?;
        let tx = self.sign(batch.opaque).await?;
        self.submit_and_watch(&tx, token).await
    }
    /// Wraps an encoded call for multisig workflows.
    pub fn opaque_call(&self, call: Vec<u8>) -> OpaqueCall {
        OpaqueCall {
            extrinsic: Transaction::new_unsigned(call.clone()).to_hex(),
            call_hash: format!("0x{}", hex::encode(sublink_interface::blake2b(&call))),
            opaque: call,
        }
    }
    pub async fn transfer_call(&self, dest: &AccountId32, value: u128) -> Result<OpaqueCall> {
        let args = vec![self.address_value(dest).into(), Value::Integer(value).into()];
        let call = self.encode_call("Balances.transfer_keep_alive", args).await?;

        Ok(self.opaque_call(call))
    }
    /// `Utility.batch` of already encoded calls.
    pub async fn batch_call(&self, calls: Vec<Vec<u8>>) -> Result<OpaqueCall> {
        let mut encoded = parity_scale_codec::Compact(calls.len() as u32).encode();
        for call in &calls {
            encoded.extend_from_slice(call);
        }

        let call = self
            .encode_call("Utility.batch", vec![CallArg::Encoded(encoded)])
            .await?;

        Ok(self.opaque_call(call))
    }
    /// Bonds the difference if more is bonded than unbonded, unbonds it
    /// otherwise. `None` if both are equal.
    pub async fn bond_or_unbond_call(&self, bond: u128, unbond: u128) -> Result<Option<OpaqueCall>> {
        let (call, value) = if bond > unbond {
            ("Staking.bond_extra", bond - unbond)
        } else if unbond > bond {
            ("Staking.unbond", unbond - bond)
        } else {
            return Ok(None);
        };

        let call = self
            .encode_call(call, vec![Value::Integer(value).into()])
            .await?;

        Ok(Some(self.opaque_call(call)))
    }
    pub async fn withdraw_call(&self, num_slashing_spans: u32) -> Result<OpaqueCall> {
        let call = self
            .encode_call(
                "Staking.withdraw_unbonded",
                vec![Value::Integer(num_slashing_spans as u128).into()],
            )
            .await?;

        Ok(self.opaque_call(call))
    }
    pub async fn nominate_call(&self, validators: &[AccountId32]) -> Result<OpaqueCall> {
        let targets = validators
            .iter()
            .map(|validator| self.address_value(validator))
            .collect();

        let call = self
            .encode_call("Staking.nominate", vec![Value::Sequence(targets).into()])
            .await?;

        Ok(self.opaque_call(call))
    }
}
