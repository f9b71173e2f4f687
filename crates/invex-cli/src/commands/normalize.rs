//! Normalize command - canonicalize a single value.

use clap::{Args, ValueEnum};
use console::style;

use invex_core::{AmountNormalizer, DateNormalizer};

use super::load_config;

/// Arguments for the normalize command.
#[derive(Args)]
pub struct NormalizeArgs {
    /// Kind of value
    #[arg(value_enum)]
    kind: ValueKind,

    /// Raw value, or free text with --extract
    value: String,

    /// Search free text for the first value of this kind
    #[arg(long)]
    extract: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ValueKind {
    /// Calendar date
    Date,
    /// Monetary amount
    Amount,
}

pub fn run(args: NormalizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let normalized = match args.kind {
        ValueKind::Date => {
            let normalizer = DateNormalizer::new(&config.postprocessing.date);
            if args.extract {
                normalizer.extract_date(&args.value)
            } else {
                normalizer.normalize(&args.value)
            }
        }
        ValueKind::Amount => {
            let normalizer = AmountNormalizer::new(&config.postprocessing.amount);
            if args.extract {
                normalizer.extract_amount(&args.value)
            } else {
                normalizer.normalize(&args.value)
            }
        }
    };

    match normalized {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => {
            eprintln!(
                "{} Could not normalize {:?} as {:?}",
                style("✗").red(),
                args.value,
                args.kind
            );
            anyhow::bail!("Normalization failed")
        }
    }
}
