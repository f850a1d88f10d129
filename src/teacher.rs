//! Assistant tasks for teachers: quizzes, essay reviews and study material.

use crate::config::Prompts;
use crate::error::{Result, TutorError};
use crate::llm::{ChatMessage, ChatModel, Completion};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Multiple choice questions generated per quiz.
pub const QUIZ_QUESTIONS: usize = 5;

/// A task a teacher can hand to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeacherTask {
    /// Multiple choice questions from course material.
    Quiz { material: String },
    /// Scored feedback on a student essay.
    EssayReview { essay: String },
    /// A short personalised lesson on a topic.
    Material { topic: String, level: String },
}

impl TeacherTask {
    pub fn name(&self) -> &'static str {
        match self {
            TeacherTask::Quiz { .. } => "quiz",
            TeacherTask::EssayReview { .. } => "essay review",
            TeacherTask::Material { .. } => "material",
        }
    }

    fn validate(&self) -> Result<()> {
        let empty = match self {
            TeacherTask::Quiz { material } => material.trim().is_empty(),
            TeacherTask::EssayReview { essay } => essay.trim().is_empty(),
            TeacherTask::Material { topic, .. } => topic.trim().is_empty(),
        };
        if empty {
            return Err(TutorError::InvalidInput(format!(
                "{} needs non-empty input",
                self.name()
            )));
        }
        Ok(())
    }

    /// The user prompt for this task.
    pub fn prompt(&self, prompts: &Prompts) -> String {
        let mut vars = HashMap::new();
        let template = match self {
            TeacherTask::Quiz { material } => {
                vars.insert("count".to_string(), QUIZ_QUESTIONS.to_string());
                vars.insert("material".to_string(), material.clone());
                &prompts.teacher.quiz
            }
            TeacherTask::EssayReview { essay } => {
                vars.insert("essay".to_string(), essay.clone());
                &prompts.teacher.essay_review
            }
            TeacherTask::Material { topic, level } => {
                vars.insert("topic".to_string(), topic.clone());
                vars.insert("level".to_string(), level.clone());
                &prompts.teacher.material
            }
        };
        prompts.render_with_custom(template, &vars)
    }

    /// Run the task as a single-message completion.
    #[instrument(skip_all, fields(task = self.name(), model = llm.model()))]
    pub async fn run(&self, llm: &dyn ChatModel, prompts: &Prompts) -> Result<Completion> {
        self.validate()?;
        let completion = llm.complete(&[ChatMessage::user(self.prompt(prompts))]).await?;
        info!("Generated {} ({} chars)", self.name(), completion.text.len());
        Ok(completion)
    }
}
