use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing::info;

use form_wizard::SubmissionStatus;
use marketplace_forms::{cli::Cli, demo, errors, logging, Config, SimulatedSubmission};

#[tokio::main]
pub async fn main() -> Result<()> {
    errors::init()?;
    let args = Cli::parse();
    let mut config = Config::new()?;
    logging::init(&config.log.level)?;

    if args.list_fields {
        print!("{}", demo::describe_steps(&args.form.steps()));
        return Ok(());
    }

    if let Some(ms) = args.delay_ms {
        config.submission.delay_ms = ms;
    }
    let mut backend = SimulatedSubmission::from_config(&config.submission);
    if let Some(message) = args.fail {
        backend = backend.failing_with(message);
    }

    let answers = match &args.answers {
        Some(path) => demo::load_answers(path)?,
        None => args.form.sample_answers(),
    };
    info!(form = %args.form, answers = answers.len(), "starting wizard");

    let mut wizard = args.form.wizard(backend)?;
    let outcome = demo::drive(&mut wizard, &answers).await?;

    for report in &outcome.steps {
        let mark = if report.passed { "ok" } else { "blocked" };
        println!("[{}/{}] {} ... {mark}", report.index + 1, wizard.step_count(), report.title);
        for (field, message) in &report.errors {
            println!("    {field}: {message}");
        }
    }

    match outcome.state.submission_status {
        SubmissionStatus::Succeeded => {
            if let Some(receipt) = &outcome.state.receipt {
                println!("submitted: reference {} ({} fields)", receipt.reference, receipt.fields);
            }
            Ok(())
        }
        SubmissionStatus::Failed => {
            let message = wizard
                .submission_error()
                .map(|e| e.to_string())
                .unwrap_or_default();
            Err(eyre!("submission failed: {message}"))
        }
        _ => Err(eyre!(
            "form incomplete: step {} did not validate",
            outcome.blocked_at().map_or(0, |i| i + 1)
        )),
    }
}
