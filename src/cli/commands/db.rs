use anyhow::Context;
use serde_json::json;

use crate::assessment::fixtures;
use crate::cli::{utils::output_success, Backend, OutputFormat};
use crate::config::AppConfig;

pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    backend.database.migrate().await?;
    backend.database.close().await;
    output_success(&output_format, "Migrations applied", None)
}

pub async fn seed(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let fixture = fixtures::seed(&*backend.store)
        .await
        .context("seeding failed (has the database been seeded already?)")?;
    backend.database.close().await;

    let data = json!({
        "organization_id": fixture.organization.id,
        "manager_id": fixture.manager.id,
        "leader_id": fixture.leader.id,
        "test_id": fixture.test.id,
    });
    if output_format == OutputFormat::Text {
        println!("organization  {}", fixture.organization.id);
        println!("manager       {}", fixture.manager.id);
        println!("leader        {}", fixture.leader.id);
        println!("test          {} ({})", fixture.test.id, fixture.test.slug);
    }
    output_success(&output_format, "Seeded demo organization", Some(data))
}
