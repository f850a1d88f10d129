//! Teacher assistant command.

use super::{load_prompts, read_material};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, TeacherAction};
use crate::config::Settings;
use crate::llm::OpenAIChat;
use crate::teacher::TeacherTask;
use anyhow::Result;

/// Run a teacher task.
pub async fn run_teacher(action: &TeacherAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Teacher, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let task = match action {
        TeacherAction::Quiz { file, text } => {
            let material = match (file, text) {
                (Some(path), _) => read_material(path).await?,
                (None, Some(text)) => text.clone(),
                (None, None) => anyhow::bail!("Provide course material with --file or --text"),
            };
            TeacherTask::Quiz { material }
        }
        TeacherAction::Essay { file } => TeacherTask::EssayReview {
            essay: read_material(file).await?,
        },
        TeacherAction::Material { topic, level } => TeacherTask::Material {
            topic: topic.clone(),
            level: level.clone(),
        },
    };

    let prompts = load_prompts(&settings)?;
    let llm = OpenAIChat::from_settings(&settings.qa.provider)?;

    let spinner = Output::spinner(&format!("Generating {}...", task.name()));
    let result = task.run(&llm, &prompts).await;
    spinner.finish_and_clear();

    let completion = result?;
    println!("\n{}\n", completion.text);
    Output::usage(completion.usage.as_ref());

    Ok(())
}
