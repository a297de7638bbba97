//! Subjects command - List one page of subjects across shards

use anyhow::{Context, Result};
use clap::Args;
use shardscope_access::{SubjectListRequest, SubjectListResponse};

use super::{create_aggregator, print_info, print_warning, ActorArgs};
use crate::GlobalOptions;

/// Arguments for the subjects command
#[derive(Args, Debug)]
pub struct SubjectsArgs {
    #[command(flatten)]
    actor: ActorArgs,

    /// Only list subjects from this shard
    #[arg(long, value_name = "SHARD")]
    shard: Option<String>,

    /// Only list subjects with this KYC status
    #[arg(long, value_name = "STATUS")]
    kyc: Option<String>,

    /// Case-insensitive substring match on name or email
    #[arg(long, short = 's')]
    search: Option<String>,

    /// Page number (1-based)
    #[arg(long, short = 'p', default_value = "1")]
    page: u64,

    /// Page size (defaults to aggregator.default_per_page)
    #[arg(long)]
    per_page: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl SubjectsArgs {
    fn to_request(&self) -> SubjectListRequest {
        SubjectListRequest {
            actor_id: self.actor.actor_id.clone(),
            actor_shard: self.actor.actor_shard.clone(),
            is_admin: self.actor.admin,
            is_manager: self.actor.manager,
            is_superior: self.actor.superior,
            shard_filter: self.shard.clone(),
            kyc_filter: self.kyc.clone(),
            search: self.search.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Execute the subjects command
pub async fn execute(args: SubjectsArgs, global: GlobalOptions) -> Result<()> {
    let aggregator = create_aggregator(&global)?;
    let response = aggregator
        .list_subjects(&args.to_request())
        .await
        .context("Failed to list subjects")?;

    for degraded in &response.degraded_shards {
        print_warning(&format!(
            "shard '{}' skipped: {}",
            degraded.shard, degraded.reason
        ));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_table(&response, global.quiet);
    }

    Ok(())
}

fn print_table(response: &SubjectListResponse, quiet: bool) {
    let pagination = &response.pagination;

    if response.data.is_empty() {
        print_info("No subjects found.", quiet);
    } else {
        let id_width = response
            .data
            .iter()
            .map(|item| item.subject.id.len())
            .max()
            .unwrap_or(0)
            .max(2);
        let shard_width = response
            .data
            .iter()
            .map(|item| item.shard_key.len())
            .max()
            .unwrap_or(0)
            .max(5);

        println!(
            "{:<shard_width$}  {:<id_width$}  {:<10}  NAME <EMAIL>",
            "SHARD", "ID", "KYC"
        );
        for item in &response.data {
            let subject = &item.subject;
            println!(
                "{:<shard_width$}  {:<id_width$}  {:<10}  {} <{}>",
                item.shard_key,
                subject.id,
                subject.kyc_status.as_deref().unwrap_or("-"),
                subject.name,
                subject.email
            );
        }
    }

    let partial = if response.partial { " (partial)" } else { "" };
    print_info(
        &format!(
            "\nPage {} of {} ({} subjects){}",
            pagination.page, pagination.total_pages, pagination.total_count, partial
        ),
        quiet,
    );
}
