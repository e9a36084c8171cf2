//! Strongbox CLI - build treasury and vendor transactions from recorded instances

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{expand_path, InstanceConfig};
use std::path::PathBuf;
use strongbox_core::{KeyHash, MemoryLedger, TxSkeleton};
use strongbox_storage::{FileRepository, InstanceRepository};

#[derive(Parser)]
#[command(name = "strongbox")]
#[command(about = "Treasury and vendor transaction builder", version)]
struct Cli {
    /// Directory holding the instance repository
    #[arg(short, long, default_value = "$HOME/.strongbox")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and record a treasury instance
    Initiate {
        /// Instance configuration (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// List recorded instances
    Instances,

    /// Withdraw the treasury's staking rewards into new treasury outputs
    TreasuryWithdraw {
        #[arg(short, long)]
        instance: String,

        /// Ledger snapshot (JSON)
        #[arg(short, long, value_name = "FILE")]
        ledger: PathBuf,

        /// Key hash of the transaction author
        #[arg(short, long)]
        author: KeyHash,

        /// Split the rewards into outputs of these amounts
        #[arg(long, num_args = 1..)]
        split: Vec<u64>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Donate an expired treasury output
    TreasurySweep {
        #[arg(short, long)]
        instance: String,

        #[arg(short, long, value_name = "FILE")]
        ledger: PathBuf,

        /// Amount to donate (default: the whole base amount)
        #[arg(long)]
        amount: Option<u64>,
    },

    /// Return unclaimed vendor payouts after the vendor script expires
    VendorSweep {
        #[arg(short, long)]
        instance: String,

        #[arg(short, long, value_name = "FILE")]
        ledger: PathBuf,
    },

    /// Return vendor outputs with unreadable datums to the treasury
    VendorRecover {
        #[arg(short, long)]
        instance: String,

        #[arg(short, long, value_name = "FILE")]
        ledger: PathBuf,
    },
}

fn print_skeleton(skeleton: &TxSkeleton) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(skeleton)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut repository = FileRepository::open(expand_path(&cli.data_dir))?;

    match cli.command {
        Commands::Initiate { config } => {
            let config = InstanceConfig::load(&config)?;
            let (record, publish) = commands::initiate(&mut repository, config)?;

            println!("Instance: {}", record.id);
            println!("Publish metadata:");
            println!("{}", serde_json::to_string_pretty(&publish)?);
        }

        Commands::Instances => {
            let records = repository.list()?;
            if records.is_empty() {
                println!("No instances recorded in {}", repository.data_dir().display());
            }
            for record in records {
                println!(
                    "{}  {}  (recorded {})",
                    record.id,
                    record.label,
                    record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }

        Commands::TreasuryWithdraw {
            instance,
            ledger,
            author,
            split,
            reason,
        } => {
            let record = repository.require(&instance)?;
            let ledger = MemoryLedger::load(&ledger)?;
            let skeleton =
                commands::treasury_withdraw(&record, &ledger, author, split, reason).await?;
            print_skeleton(&skeleton)?;
        }

        Commands::TreasurySweep {
            instance,
            ledger,
            amount,
        } => {
            let record = repository.require(&instance)?;
            let ledger = MemoryLedger::load(&ledger)?;
            let skeleton = commands::treasury_sweep(&record, &ledger, amount).await?;
            print_skeleton(&skeleton)?;
        }

        Commands::VendorSweep { instance, ledger } => {
            let record = repository.require(&instance)?;
            let ledger = MemoryLedger::load(&ledger)?;
            let skeleton = commands::vendor_sweep(&record, &ledger).await?;
            print_skeleton(&skeleton)?;
        }

        Commands::VendorRecover { instance, ledger } => {
            let record = repository.require(&instance)?;
            let ledger = MemoryLedger::load(&ledger)?;
            let skeleton = commands::vendor_recover(&record, &ledger).await?;
            print_skeleton(&skeleton)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_treasury_withdraw() {
        let author = "07".repeat(28);
        let cli = Cli::try_parse_from([
            "strongbox",
            "treasury-withdraw",
            "--instance",
            "abc",
            "--ledger",
            "snapshot.json",
            "--author",
            &author,
            "--split",
            "400",
            "500",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, "$HOME/.strongbox");
        match cli.command {
            Commands::TreasuryWithdraw { author, split, .. } => {
                assert_eq!(author, KeyHash([7; 28]));
                assert_eq!(split, vec![400, 500]);
            }
            _ => panic!("expected treasury-withdraw"),
        }
    }

    #[test]
    fn test_reject_malformed_author() {
        let result = Cli::try_parse_from([
            "strongbox",
            "treasury-withdraw",
            "--instance",
            "abc",
            "--ledger",
            "snapshot.json",
            "--author",
            "not-hex",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_initiate_and_instances() {
        let cli =
            Cli::try_parse_from(["strongbox", "initiate", "--config", "instance.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Initiate { .. }));

        let cli = Cli::try_parse_from(["strongbox", "--data-dir", "/tmp/sb", "instances"]).unwrap();
        assert_eq!(cli.data_dir, "/tmp/sb");
        assert!(matches!(cli.command, Commands::Instances));
    }
}
