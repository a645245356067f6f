//! One-shot lookup deletion against a running journal API.
//!
//! Usage:
//!   brewlog-admin <kind> <id>                 report usage, then cancel
//!   brewlog-admin <kind> <id> --remove        strip references and delete
//!   brewlog-admin <kind> <id> --replace <id>  repoint references and delete

use std::sync::Arc;

use anyhow::{Context, bail};
use brewlog::{
    DeletionIntent, DeletionManager, JournalClient, JournalConfig, LookupId, LookupKind,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn parse_args() -> anyhow::Result<(LookupKind, LookupId, Option<DeletionIntent>)> {
    let mut args = std::env::args().skip(1);

    let kind: LookupKind = args
        .next()
        .context("missing <kind> (e.g. roaster, grinder, bean_type)")?
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown lookup kind"))?;
    let id = LookupId(
        args.next()
            .context("missing <id>")?
            .parse()
            .context("<id> must be an integer")?,
    );

    let intent = match args.next().as_deref() {
        None => None,
        Some("--remove") => Some(DeletionIntent::RemoveReferences),
        Some("--replace") => {
            let replacement = args
                .next()
                .context("--replace requires a replacement id")?
                .parse()
                .context("replacement id must be an integer")?;
            Some(DeletionIntent::ReplaceReferences(LookupId(replacement)))
        }
        Some(flag) => bail!("unknown flag: {flag}"),
    };
    Ok((kind, id, intent))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("brewlog=info".parse()?))
        .init();

    let (kind, id, intent) = parse_args()?;

    let config = JournalConfig::load()?;
    let client = JournalClient::from_config(&config)?;
    let manager =
        DeletionManager::new(Arc::new(client)).with_sample_limit(config.usage.sample_limit);

    let outcome = manager
        .request_deletion(kind, id, |report| match intent {
            Some(intent) => intent,
            None => {
                // No intent given on the command line: report and back out.
                match report.info() {
                    Some(info) => {
                        eprintln!(
                            "{kind} {id} is referenced by {} {}:",
                            info.usage_count,
                            info.counted.label()
                        );
                        for sample in &info.recent_samples {
                            eprintln!(
                                "  {} ({})",
                                sample.label,
                                sample.timestamp.format("%Y-%m-%d")
                            );
                        }
                    }
                    None => eprintln!("{kind} {id}: usage could not be verified"),
                }
                eprintln!("Re-run with --remove or --replace <id> to proceed.");
                DeletionIntent::Cancel
            }
        })
        .await?;

    println!("{outcome}");
    Ok(())
}
