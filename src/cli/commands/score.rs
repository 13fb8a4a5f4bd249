use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::assessment::scorer::check_answers;
use crate::assessment::{AnswerSet, Axis, Score, Test};
use crate::cli::commands::test::TestDefinition;
use crate::cli::utils::{format_score, output_data, read_document};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct ScoreArgs {
    #[arg(help = "Answers file: { \"<question id>\": \"D|I|S|C\" } as JSON or YAML")]
    pub answers: PathBuf,
    #[arg(long, help = "Test definition to check the answers against")]
    pub test: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct OfflineScore {
    pub answered: usize,
    pub score: Score,
    pub dominant: Axis,
}

pub fn handle(args: ScoreArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw: HashMap<String, String> = read_document(&args.answers)?;
    let answers = AnswerSet::from_raw(&raw)?;

    if let Some(path) = args.test {
        let definition: TestDefinition = read_document(&path)?;
        let test: Test = definition.into();
        check_answers(&test, &answers)?;
    }

    let score = Score::tally(&answers);
    let report = OfflineScore { answered: answers.len(), score, dominant: score.dominant() };
    output_data(&output_format, &report, |r| {
        println!("{} answers", r.answered);
        println!("{}", format_score(&r.score));
        println!("dominant: {} ({})", r.dominant, r.dominant.label());
    })
}
