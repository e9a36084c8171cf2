//! Command implementations, independent of argument parsing

use crate::config::{InstanceConfig, DEFAULT_CONTEXT};
use strongbox_core::{KeyHash, Ledger, TxSkeleton};
use strongbox_metadata::{Event, TxMetadata};
use strongbox_storage::{InstanceRecord, InstanceRepository};
use strongbox_treasury::TreasuryContext;
use strongbox_vendor::VendorContext;

pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Validate and record an instance, returning it with its publish record
pub fn initiate(
    repository: &mut dyn InstanceRepository,
    config: InstanceConfig,
) -> CommandResult<(InstanceRecord, TxMetadata)> {
    let record = InstanceRecord::new(config.label.clone(), config.treasury, config.vendor)?;
    let publish = TxMetadata::new(
        config.context,
        Event::Publish {
            label: config.label,
            description: config.description,
            expiration: record.treasury.expiration,
            payout_upperbound: record.treasury.payout_upperbound,
            vendor_expiration: record.vendor.expiration,
        },
    )
    .for_instance(record.id.clone());

    if repository.get(&record.id)?.is_some() {
        log::warn!("Instance {} already recorded, replacing it", record.id);
    }
    repository.put(record.clone())?;
    Ok((record, publish))
}

pub async fn treasury_withdraw<L: Ledger + ?Sized>(
    record: &InstanceRecord,
    ledger: &L,
    author: KeyHash,
    split: Vec<u64>,
    reason: Option<String>,
) -> CommandResult<TxSkeleton> {
    let context = TreasuryContext::load(ledger, record.treasury.clone()).await?;
    let metadata = TxMetadata::new(DEFAULT_CONTEXT, Event::Initialize { reason })
        .for_instance(record.id.clone());
    let params = strongbox_treasury::WithdrawParams {
        author,
        amounts: split,
        metadata,
    };
    Ok(strongbox_treasury::withdraw(&context, ledger, params).await?)
}

/// Sweep the treasury output holding the most base asset
pub async fn treasury_sweep<L: Ledger + ?Sized>(
    record: &InstanceRecord,
    ledger: &L,
    amount: Option<u64>,
) -> CommandResult<TxSkeleton> {
    let context = TreasuryContext::load(ledger, record.treasury.clone()).await?;
    let input = context
        .unspent_outputs(ledger)
        .await?
        .into_iter()
        .max_by_key(|utxo| utxo.value.base_amount())
        .ok_or("No treasury outputs to sweep")?;
    let now = ledger.chain_time().await?;
    log::info!("Sweeping treasury output {}", input.reference);

    let params = strongbox_treasury::SweepParams { now, input, amount };
    Ok(strongbox_treasury::sweep(&context, params)?)
}

/// Sweep every well-formed vendor output
pub async fn vendor_sweep<L: Ledger + ?Sized>(
    record: &InstanceRecord,
    ledger: &L,
) -> CommandResult<TxSkeleton> {
    let context = VendorContext::load_for(ledger, &record.treasury, record.vendor.clone()).await?;
    let outputs = context.unspent_outputs(ledger).await?;
    if outputs.well_formed.is_empty() {
        return Err("No vendor outputs to sweep".into());
    }
    if !outputs.malformed.is_empty() {
        log::warn!(
            "Skipping {} malformed vendor outputs; use vendor-recover",
            outputs.malformed.len()
        );
    }
    let now = ledger.chain_time().await?;

    let inputs = outputs.well_formed.into_iter().map(|(utxo, _)| utxo).collect();
    let params = strongbox_vendor::SweepParams { now, inputs };
    Ok(strongbox_vendor::sweep(&context, params)?)
}

/// Return every malformed vendor output to the treasury
pub async fn vendor_recover<L: Ledger + ?Sized>(
    record: &InstanceRecord,
    ledger: &L,
) -> CommandResult<TxSkeleton> {
    let context = VendorContext::load_for(ledger, &record.treasury, record.vendor.clone()).await?;
    let outputs = context.unspent_outputs(ledger).await?;
    if outputs.malformed.is_empty() {
        return Err("No malformed vendor outputs found".into());
    }
    Ok(strongbox_vendor::recover_malformed(&context, outputs.malformed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::SAMPLE;
    use strongbox_core::*;
    use strongbox_storage::MemoryRepository;

    const NOW: Timestamp = 1_700_000_000_000;

    fn record() -> (MemoryRepository, InstanceRecord) {
        let mut repository = MemoryRepository::new();
        let (record, _) =
            initiate(&mut repository, InstanceConfig::parse(SAMPLE).unwrap()).unwrap();
        (repository, record)
    }

    async fn deployed_ledger(record: &InstanceRecord) -> MemoryLedger {
        let scripts = ScriptRegistry {
            treasury: ScriptHash([1; 28]),
            vendor: ScriptHash([2; 28]),
        };
        let holder = Address::key(KeyHash([50; 28]));
        let ledger = MemoryLedger::new(NOW);
        ledger
            .add_output(
                UnspentOutput::new(
                    OutputReference::new(TxHash([1; 32]), 0),
                    holder.clone(),
                    AssetBundle::from_base(2_000_000)
                        .with(registry_asset(record.treasury.registry_token), 1),
                )
                .with_datum(scripts.to_bytes().unwrap()),
            )
            .await;
        for (index, hash) in [scripts.treasury, scripts.vendor].into_iter().enumerate() {
            ledger
                .add_output(
                    UnspentOutput::new(
                        OutputReference::new(TxHash([2; 32]), index as u32),
                        holder.clone(),
                        AssetBundle::from_base(30_000_000),
                    )
                    .with_script_ref(hash),
                )
                .await;
        }
        ledger
    }

    #[test]
    fn test_initiate_records_instance_and_publish_body() {
        let (repository, record) = record();
        assert_eq!(repository.require(&record.id).unwrap(), record);

        let (_, publish) = initiate(
            &mut MemoryRepository::new(),
            InstanceConfig::parse(SAMPLE).unwrap(),
        )
        .unwrap();
        assert_eq!(publish.body.name(), "publish");
        assert_eq!(publish.instance.as_deref(), Some(record.id.as_str()));
    }

    #[test]
    fn test_initiate_rejects_mismatched_vendor() {
        let mut config = InstanceConfig::parse(SAMPLE).unwrap();
        config.vendor.expiration = config.treasury.payout_upperbound - 1;
        let mut repository = MemoryRepository::new();
        assert!(initiate(&mut repository, config).is_err());
        assert!(repository.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_treasury_withdraw_relocks_rewards() {
        let (_, record) = record();
        let ledger = deployed_ledger(&record).await;
        let context = TreasuryContext::load(&ledger, record.treasury.clone()).await.unwrap();
        ledger
            .set_reward_balance(&context.deployment.treasury_reward_account(), 900)
            .await;

        let skeleton = treasury_withdraw(&record, &ledger, KeyHash([7; 28]), vec![400, 500], None)
            .await
            .unwrap();
        assert_eq!(skeleton.outputs.len(), 2);
        assert!(skeleton.required_signers.contains(&KeyHash([7; 28])));
    }

    #[tokio::test]
    async fn test_treasury_sweep_needs_an_output() {
        let (_, record) = record();
        let ledger = deployed_ledger(&record).await;
        ledger.set_time(record.treasury.expiration + 1).await;
        assert!(treasury_sweep(&record, &ledger, None).await.is_err());
    }

    #[tokio::test]
    async fn test_treasury_sweep_donates_largest_output() {
        let (_, record) = record();
        let ledger = deployed_ledger(&record).await;
        let context = TreasuryContext::load(&ledger, record.treasury.clone()).await.unwrap();
        for (index, amount) in [(0, 10), (1, 90)] {
            ledger
                .add_output(
                    UnspentOutput::new(
                        OutputReference::new(TxHash([3; 32]), index),
                        context.address(),
                        AssetBundle::from_base(amount),
                    )
                    .with_datum(datum::void()),
                )
                .await;
        }
        ledger.set_time(record.treasury.expiration + 1).await;

        let skeleton = treasury_sweep(&record, &ledger, Some(40)).await.unwrap();
        assert_eq!(skeleton.donation, Some(40));
        assert_eq!(skeleton.outputs[0].value, AssetBundle::from_base(50));
    }

    #[tokio::test]
    async fn test_vendor_recover_collects_malformed_outputs() {
        let (_, record) = record();
        let ledger = deployed_ledger(&record).await;
        let context = VendorContext::load(&ledger, record.vendor.clone()).await.unwrap();
        assert!(vendor_recover(&record, &ledger).await.is_err());

        ledger
            .add_output(
                UnspentOutput::new(
                    OutputReference::new(TxHash([4; 32]), 0),
                    context.address(),
                    AssetBundle::from_base(75),
                )
                .with_datum(vec![0xff]),
            )
            .await;
        let skeleton = vendor_recover(&record, &ledger).await.unwrap();
        assert_eq!(skeleton.outputs[0].address, context.treasury_address());
        assert!(vendor_sweep(&record, &ledger).await.is_err());
    }
}
