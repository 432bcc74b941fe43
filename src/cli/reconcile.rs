//! `gridflux reconcile` - archive backfill of missing days.

use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use super::output;
use super::ReconcileArgs;
use crate::cache::AggregationCache;
use crate::config::Config;
use crate::domain::{EntityId, SourceId};
use crate::pipeline::ReconcileResult;
use crate::service::{build_reconciler, build_store};

pub async fn run(args: ReconcileArgs, config: &Config) -> anyhow::Result<()> {
    let store = build_store(config).await.context("opening raw store")?;
    let cache = Arc::new(AggregationCache::new(&config.cache));
    let reconciler = build_reconciler(config, store, cache);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let results: Vec<(String, ReconcileResult)> = if let Some(entity) = &args.entity {
        spinner.set_message(format!("Reconciling {entity}"));
        let result = reconciler
            .reconcile(&EntityId::new(entity.as_str()), args.from, args.to)
            .await?;
        vec![(entity.clone(), result)]
    } else if let Some(source) = &args.source {
        spinner.set_message(format!("Reconciling source {source}"));
        reconciler
            .reconcile_source(&SourceId::new(source.as_str()), args.from, args.to)
            .await?
            .into_iter()
            .map(|(entity, result)| (entity.to_string(), result))
            .collect()
    } else {
        anyhow::bail!("pass either --entity or --source");
    };

    spinner.finish_and_clear();

    output::section("Reconciliation");
    for (entity, result) in &results {
        output::key_value("entity", entity);
        output::key_value("filled days", result.filled_days.len());
        output::key_value("net-new", result.inserted);
        output::key_value("re-delivered", result.duplicates);
        if !result.unresolved_days.is_empty() {
            let days: Vec<String> = result
                .unresolved_days
                .iter()
                .map(ToString::to_string)
                .collect();
            output::key_value("unresolved", days.join(", "));
        }
        println!();
    }

    Ok(())
}
