//! Prompt templates for Tutorly.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub guide: GuidePrompts,
    pub research: ResearchPrompts,
    pub teacher: TeacherPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for direct answers grounded in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    /// System instruction; `{{context}}` receives the retrieved excerpts.
    pub system: String,
    /// Returned verbatim when retrieval finds nothing, without calling the model.
    pub fallback_answer: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant that answers questions based on the provided context.

CONTEXT:
{{context}}

Answer the question based ONLY on the information provided in the context. If the answer cannot be found in the context, say "I don't have enough information to answer this question." Do not make up information."#.to_string(),

            fallback_answer: "Sorry, that topic does not appear to be covered in the document.".to_string(),
        }
    }
}

/// Prompts for Socratic tutoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidePrompts {
    pub system: String,
    /// Introduces optional document excerpts; `{{context}}` receives them.
    pub context: String,
}

impl Default for GuidePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an educational AI assistant designed to help students solve problems through guided learning.
Your goal is to guide students through problem-solving processes WITHOUT providing direct answers.

Follow these guiding principles:

1. NEVER solve problems completely - break them into steps and guide students through the process
2. Use the Socratic method - ask questions that lead students toward discovering solutions themselves
3. Provide personalized guidance based on the student's apparent knowledge level
4. Use a scaffolded approach - offer progressively more detailed hints only when the student explicitly asks for the next hint
5. Help students identify and apply appropriate problem-solving methodologies

When responding to problems:
- First identify the type of problem and relevant concepts
- Guide the student to identify the approach or formula they should use
- Always end with at least one specific question that prompts the student to try the next step themselves
- If they're struggling, provide a hint but NOT the solution to that step
- Let them know they can ask for the next hint if needed"#.to_string(),

            context: "Here is relevant educational content to inform your guidance:\n{{context}}".to_string(),
        }
    }
}

/// Prompts for explaining web search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    pub system: String,
    pub user: String,
    /// Used instead of `user` for questions in Romanian.
    pub user_ro: String,
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful AI tutor.".to_string(),

            user: r#"You are an educational AI assistant helping a {{level}} student interested in {{domain}}.
You have access to the online sources below. Provide a short, clear explanation, followed by guiding questions. Include a relevant source link.

Search Results:
{{results}}

Student Question: {{question}}

Generate the answer based on the sources above."#.to_string(),

            user_ro: r#"Ești un asistent educațional care ajută un elev de nivel {{level}} interesat de domeniul {{domain}}.
Ai acces la sursele în limba română de mai jos. Oferă o explicație clară, apoi formulează întrebări care să ghideze elevul. Include un link către sursa utilizată.

Rezultatele căutării:
{{results}}

Întrebarea elevului: {{question}}

Răspunde în limba română, pe baza surselor de mai sus."#.to_string(),
        }
    }
}

/// Prompts for the teacher assistant tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherPrompts {
    pub quiz: String,
    pub essay_review: String,
    pub material: String,
}

impl Default for TeacherPrompts {
    fn default() -> Self {
        Self {
            quiz: "Generate {{count}} multiple choice questions from the material below. Each question should have 1 correct answer and 3 distractors.\n\n{{material}}".to_string(),

            essay_review: "Evaluate the following student essay. Analyze content, structure, grammar, and coherence. Then give a score from 1 to 10 and a summary of improvements.\n\nEssay:\n{{essay}}".to_string(),

            material: "Create a personalized learning resource on the topic: {{topic}}. Target level: {{level}}. The output should include a short explanation, 2 examples, and 3 practice questions.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let guide_path = custom_path.join("guide.toml");
            if guide_path.exists() {
                let content = std::fs::read_to_string(&guide_path)?;
                prompts.guide = toml::from_str(&content)?;
            }

            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                let content = std::fs::read_to_string(&research_path)?;
                prompts.research = toml::from_str(&content)?;
            }

            let teacher_path = custom_path.join("teacher.toml");
            if teacher_path.exists() {
                let content = std::fs::read_to_string(&teacher_path)?;
                prompts.teacher = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in one pass over the template, so text
    /// inside a substituted value is never expanded. Unknown placeholders
    /// are left as they are.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.qa.system.contains("{{context}}"));
        assert!(!prompts.qa.fallback_answer.is_empty());
        assert!(prompts.guide.system.contains("WITHOUT providing direct answers"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), "5".to_string());
        vars.insert(
            "material".to_string(),
            "Chapter asks for {{count}} proofs".to_string(),
        );

        let template = "Write {{count}} questions about: {{material}} ({{unknown}})";
        for _ in 0..50 {
            assert_eq!(
                Prompts::render(template, &vars),
                "Write 5 questions about: Chapter asks for {{count}} proofs ({{unknown}})"
            );
        }
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("level".to_string(), "university".to_string());
        prompts.variables.insert("domain".to_string(), "physics".to_string());

        let mut vars = HashMap::new();
        vars.insert("level".to_string(), "high school".to_string());

        let rendered = prompts.render_with_custom("{{level}} / {{domain}}", &vars);
        assert_eq!(rendered, "high school / physics");
    }

    #[test]
    fn test_custom_dir_overrides_only_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("qa.toml"),
            "fallback_answer = \"Not in the notes.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.qa.fallback_answer, "Not in the notes.");
        // Missing fields in an override file keep their defaults.
        assert!(prompts.qa.system.contains("{{context}}"));
        assert_eq!(prompts.guide.system, GuidePrompts::default().system);
    }
}
