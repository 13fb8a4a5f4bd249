use clap::Args;
use uuid::Uuid;

use crate::assessment::AssignmentManager;
use crate::assessment::Scorer;
use crate::cli::utils::{format_score, output_data, output_empty_collection};
use crate::cli::{Backend, OutputFormat};
use crate::config::AppConfig;
use crate::types::Pagination;

#[derive(Args)]
pub struct AssignArgs {
    #[arg(long, help = "Leader profile id")]
    pub leader: Uuid,
    #[arg(long, help = "Test id")]
    pub test: Uuid,
    #[arg(long, help = "Organization id")]
    pub org: Uuid,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, conflicts_with = "leader", required_unless_present = "leader", help = "Organization id")]
    pub org: Option<Uuid>,
    #[arg(long, help = "Leader profile id")]
    pub leader: Option<Uuid>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = Pagination::DEFAULT_LIMIT)]
    pub limit: u32,
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(long, help = "Organization id")]
    pub org: Uuid,
}

#[derive(Args)]
pub struct ResultArgs {
    #[arg(help = "Assignment id")]
    pub assignment: Uuid,
}

pub async fn assign(args: AssignArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let manager = AssignmentManager::new(backend.store, backend.policy);
    let assignment = manager.assign(args.leader, args.test, args.org).await?;
    output_data(&output_format, &assignment, |a| println!("✓ Created assignment {}", a.id))
}

pub async fn list(args: ListArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let manager = AssignmentManager::new(backend.store, backend.policy);
    let pagination = Pagination::new(args.page, args.limit).capped(config.api.max_page_size);

    let page = match (args.org, args.leader) {
        (_, Some(leader)) => manager.list_for_assignee(leader, pagination).await?,
        (Some(org), None) => manager.list_for_organization(org, pagination).await?,
        (None, None) => anyhow::bail!("either --org or --leader is required"),
    };
    if page.items.is_empty() {
        return output_empty_collection(&output_format, "items", "No assignments");
    }

    output_data(&output_format, &page, |page| {
        for view in &page.items {
            let who = view
                .profile
                .as_ref()
                .and_then(|p| p.full_name.as_deref())
                .unwrap_or("-");
            println!(
                "{}  {:<9} {:<24} {}",
                view.assignment.id,
                format!("{:?}", view.status).to_lowercase(),
                view.test_title.as_deref().unwrap_or("-"),
                who
            );
        }
        println!("({} of {} total)", page.items.len(), page.total);
    })
}

pub async fn stats(args: StatsArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let manager = AssignmentManager::new(backend.store, backend.policy);
    let stats = manager.stats(args.org).await?;
    output_data(&output_format, &stats, |s| {
        println!("total      {}", s.total);
        println!("pending    {}", s.pending);
        println!("completed  {} ({}%)", s.completed, s.completion_rate());
    })
}

pub async fn result(args: ResultArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let scorer = Scorer::new(backend.store, backend.policy);
    let result = scorer.result_for(args.assignment).await?;
    output_data(&output_format, &result, |r| {
        println!("{}", format_score(&r.score));
        println!("dominant: {} ({})", r.dominant(), r.dominant().label());
        println!("submitted {}", r.created_at.to_rfc3339());
    })
}
