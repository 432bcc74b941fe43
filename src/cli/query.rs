//! `gridflux query` - the full smoothed annual-energy pipeline.

use anyhow::Context;
use chrono::{TimeZone, Utc};
use tabled::{Table, Tabled};

use super::output;
use super::QueryArgs;
use crate::config::Config;
use crate::domain::{Cadence, EntityId, QueryRequest, SmoothingMethod, TimeRange};
use crate::service::build_query_service;

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "interval start")]
    timestamp: String,
    #[tabled(rename = "annual energy")]
    value: String,
}

fn build_request(args: &QueryArgs) -> anyhow::Result<QueryRequest> {
    let start = Utc.from_utc_datetime(
        &args
            .from
            .and_hms_opt(0, 0, 0)
            .context("invalid start day")?,
    );
    let end = Utc.from_utc_datetime(
        &args
            .to
            .succ_opt()
            .context("range end overflows the calendar")?
            .and_hms_opt(0, 0, 0)
            .context("invalid end day")?,
    );

    let method = match args.method.as_str() {
        "exponential" => SmoothingMethod::Exponential { span: args.span },
        "loess" => SmoothingMethod::Loess {
            fraction: args.fraction,
        },
        other => anyhow::bail!("unknown smoothing method '{other}'"),
    };

    Ok(QueryRequest {
        entities: args.entities.iter().map(|e| EntityId::new(e.as_str())).collect(),
        range: TimeRange::new(start, end).map_err(crate::error::Error::Validation)?,
        target_cadence: Cadence::from_minutes(args.cadence)
            .map_err(crate::error::Error::Validation)?,
        method,
        reference_year_days: args.year_days,
        unit_scale: args.unit_scale,
    })
}

pub async fn run(args: QueryArgs, config: &Config) -> anyhow::Result<()> {
    let request = build_request(&args)?;
    let service = build_query_service(config)
        .await
        .context("assembling query service")?;

    let response = service.execute(&request).await?;

    output::section("Smoothed annual energy");
    let rows: Vec<SeriesRow> = response
        .points
        .iter()
        .map(|(ts, value)| SeriesRow {
            timestamp: ts.to_rfc3339(),
            value: value.map_or_else(|| "—".into(), |v| format!("{v:.6}")),
        })
        .collect();
    println!("{}", Table::new(rows));

    output::key_value(
        "coverage",
        output::response_coverage_label(response.coverage_status),
    );
    output::key_value("cache", output::cache_label(response.cache_status));

    Ok(())
}
