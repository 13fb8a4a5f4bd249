use chrono::Utc;
use clap::Subcommand;
use serde::Deserialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::assessment::{Question, Test, TestCatalog};
use crate::cli::utils::{output_data, output_empty_collection, read_document};
use crate::cli::{Backend, OutputFormat};
use crate::config::AppConfig;
use crate::types::Pagination;

#[derive(Subcommand)]
pub enum TestCommands {
    #[command(about = "List published tests, newest first")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = Pagination::DEFAULT_LIMIT)]
        limit: u32,
    },

    #[command(about = "Show a test by id or slug")]
    Show {
        #[arg(help = "Test id or slug")]
        test: String,
    },

    #[command(about = "Publish a test definition from a YAML or JSON file")]
    Publish {
        #[arg(help = "Path to the definition file")]
        file: PathBuf,
    },
}

/// On-disk test definition; ids and timestamps are assigned on publish
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

impl From<TestDefinition> for Test {
    fn from(def: TestDefinition) -> Self {
        Test {
            id: Uuid::new_v4(),
            slug: def.slug,
            title: def.title,
            description: def.description,
            questions: def.questions,
            created_at: Utc::now(),
        }
    }
}

pub async fn handle(cmd: TestCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let catalog = TestCatalog::new(backend.store.clone(), backend.policy);

    match cmd {
        TestCommands::List { page, limit } => {
            let page = catalog
                .list_tests(Pagination::new(page, limit).capped(config.api.max_page_size))
                .await?;
            if page.items.is_empty() {
                return output_empty_collection(&output_format, "items", "No tests published");
            }
            output_data(&output_format, &page, |page| {
                for t in &page.items {
                    println!("{}  {:<20} {:>3} questions  {}", t.id, t.slug, t.question_count, t.title);
                }
                println!("({} of {} total)", page.items.len(), page.total);
            })
        }
        TestCommands::Show { test } => {
            let test = match Uuid::parse_str(&test) {
                Ok(id) => catalog.get_test(id).await?,
                Err(_) => catalog.get_test_by_slug(&test).await?,
            };
            output_data(&output_format, &test, print_test)
        }
        TestCommands::Publish { file } => {
            let definition: TestDefinition = read_document(&file)?;
            let test = catalog.publish(definition.into()).await?;
            output_data(&output_format, &test.summary(), |t| {
                println!("✓ Published '{}' as {} ({} questions)", t.slug, t.id, t.question_count)
            })
        }
    }
}

fn print_test(test: &Test) {
    println!("{} - {}", test.slug, test.title);
    if !test.description.is_empty() {
        println!("{}", test.description);
    }
    for q in &test.questions {
        println!();
        println!("{}. {}", q.id, q.text);
        for option in &q.options {
            println!("   [{}] {}", option.axis, option.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_definition_becomes_a_valid_test() {
        let yaml = r#"
slug: quick-disc
title: Quick DISC
questions:
  - id: 1
    text: "Pick one"
    options:
      - { text: "Lead", type: D }
      - { text: "Inspire", type: I }
"#;
        let def: TestDefinition = serde_yaml::from_str(yaml).unwrap();
        let test: Test = def.into();
        assert!(test.validate().is_ok());
        assert_eq!(test.questions[0].options[1].axis, crate::assessment::Axis::I);
        assert_eq!(test.description, "");
    }
}
