use clap::Args;
use std::io::{BufRead, Write};
use uuid::Uuid;

use crate::assessment::{AnswerSet, AssignmentManager, Axis, ResponseSession, Scorer, Test, TestCatalog};
use crate::cli::utils::{format_score, output_data};
use crate::cli::{Backend, OutputFormat};
use crate::config::AppConfig;

#[derive(Args)]
pub struct TakeArgs {
    #[arg(help = "Assignment id")]
    pub assignment: Uuid,
    #[arg(long, help = "Leader profile id answering the assignment")]
    pub user: Uuid,
}

pub async fn handle(args: TakeArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = Backend::connect(config).await?;
    let assignments = AssignmentManager::new(backend.store.clone(), backend.policy);
    let catalog = TestCatalog::new(backend.store.clone(), backend.policy);
    let scorer = Scorer::new(backend.store, backend.policy);

    let assignment = assignments.get_by_id(args.assignment).await?;
    if assignment.leader_id != args.user {
        anyhow::bail!("assignment {} does not belong to {}", args.assignment, args.user);
    }
    if assignment.is_completed() {
        anyhow::bail!("assignment {} has already been completed", args.assignment);
    }
    let test = catalog.get_test(assignment.test_id).await?;

    let stdin = std::io::stdin();
    let answers = run_session(test, stdin.lock(), std::io::stderr())?;

    let result = scorer.submit(assignment.id, args.user, answers).await?;
    output_data(&output_format, &result, |r| {
        println!("✓ Submitted. {}", format_score(&r.score));
        println!("dominant: {} ({})", r.dominant(), r.dominant().label());
    })
}

/// Walk the test question by question.
///
/// At each prompt: an option number or axis letter answers and moves on,
/// `b` goes back, `q` aborts. Ends once the last question is answered.
pub fn run_session<R: BufRead, W: Write>(test: Test, mut input: R, mut out: W) -> anyhow::Result<AnswerSet> {
    let mut session = ResponseSession::new(test);
    if session.test().questions.is_empty() {
        anyhow::bail!("test '{}' has no questions", session.test().slug);
    }

    writeln!(out, "{} ({} questions)", session.test().title, session.test().questions.len())?;
    let mut line = String::new();

    loop {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        let (answered, total) = session.current_progress();
        writeln!(out)?;
        writeln!(out, "[{}/{}] {}", session.position() + 1, total, question.text)?;
        for (i, option) in question.options.iter().enumerate() {
            let marker = if session.current_answer() == Some(option.axis) { "*" } else { " " };
            writeln!(out, " {}{}) {}", marker, i + 1, option.text)?;
        }
        write!(out, "({} answered) > ", answered)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            anyhow::bail!("input ended before the test was finished");
        }
        let choice = line.trim();

        match choice {
            "q" => anyhow::bail!("aborted, nothing was submitted"),
            "b" => {
                if !session.back() {
                    writeln!(out, "already at the first question")?;
                }
                continue;
            }
            _ => {}
        }

        let axis = match choice.parse::<usize>() {
            Ok(n) if (1..=question.options.len()).contains(&n) => Some(question.options[n - 1].axis),
            Ok(_) => None,
            Err(_) => choice.to_uppercase().parse::<Axis>().ok(),
        };
        let Some(axis) = axis else {
            writeln!(out, "answer with 1-{}, an axis letter, b or q", question.options.len())?;
            continue;
        };
        if let Err(e) = session.record_answer(question.id, axis) {
            writeln!(out, "{}", e)?;
            continue;
        }

        if !session.advance() && session.is_complete() {
            break;
        }
    }

    Ok(session.into_answer_set())
}
