//! `gridflux audit` - operational coverage reporting.

use anyhow::Context;
use tabled::{Table, Tabled};

use super::output;
use super::AuditArgs;
use crate::config::Config;
use crate::domain::{EntityId, IntegrityReport, SourceId};
use crate::service::build_auditor;

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "entity")]
    entity: String,
    #[tabled(rename = "day")]
    day: String,
    #[tabled(rename = "expected")]
    expected: usize,
    #[tabled(rename = "actual")]
    actual: usize,
    #[tabled(rename = "status")]
    status: String,
}

impl From<&IntegrityReport> for AuditRow {
    fn from(report: &IntegrityReport) -> Self {
        Self {
            entity: report.entity_id.to_string(),
            day: report.day.to_string(),
            expected: report.expected_count,
            actual: report.actual_count,
            status: output::coverage_label(report.status),
        }
    }
}

pub async fn run(args: AuditArgs, config: &Config) -> anyhow::Result<()> {
    let auditor = build_auditor(config).await.context("opening raw store")?;

    let reports = if let Some(entity) = &args.target.entity {
        auditor
            .audit_days(&EntityId::new(entity.as_str()), args.from, args.to)
            .await?
    } else {
        let source = args.target.source.as_deref().unwrap_or_default();
        auditor
            .audit_source(&SourceId::new(source), args.from, args.to)
            .await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    output::section("Coverage audit");
    let rows: Vec<AuditRow> = reports.iter().map(AuditRow::from).collect();
    println!("{}", Table::new(rows));

    let complete = reports
        .iter()
        .filter(|r| r.status == crate::domain::DayCoverage::Complete)
        .count();
    output::key_value("days", reports.len());
    output::key_value("complete", complete);
    output::key_value("gaps", reports.len() - complete);

    Ok(())
}
