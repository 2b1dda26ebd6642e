//! Prompt and reply templates for Arbitro.
//!
//! Templates can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"))
}

/// Collection of all templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub bot: BotMessages,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Template used to build the inference prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Receives `{{context}}` and `{{question}}`.
    pub template: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            template: "Responde a la siguiente pregunta basándote únicamente en este reglamento:\n\n\
                       {{context}}\n\n\
                       Pregunta: {{question}}"
                .to_string(),
        }
    }
}

/// Fixed chat replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotMessages {
    pub welcome: String,
    /// Receives `{{status}}`.
    pub status_error: String,
    /// Receives `{{detail}}`.
    pub transport_error: String,
    pub unexpected_response: String,
    pub retrieval_error: String,
    /// Sent when the model returns only whitespace.
    pub empty_answer: String,
}

impl Default for BotMessages {
    fn default() -> Self {
        Self {
            welcome: "👋 ¡Hola! Soy el bot de Árbitros FEXB.\n\n\
                      🟠 Puedes preguntarme sobre:\n\
                      - Reglamentos de baloncesto\n\
                      - Interpretaciones técnicas\n\
                      - Cómo redactar informes\n\n\
                      ❓ Escribe tu duda y te ayudaré."
                .to_string(),
            status_error: "⚠️ Error con la IA ({{status}})".to_string(),
            transport_error: "⚠️ No se pudo contactar con la IA: {{detail}}".to_string(),
            unexpected_response: "⚠️ Respuesta inesperada de la IA.".to_string(),
            retrieval_error: "⚠️ No se pudo consultar el reglamento.".to_string(),
            empty_answer: "Sin respuesta.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let bot_path = custom_path.join("bot.toml");
            if bot_path.exists() {
                let content = std::fs::read_to_string(&bot_path)?;
                prompts.bot = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a template with the given variables in a single pass.
    ///
    /// Substituted values are never scanned again, and unknown placeholders
    /// are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_pattern()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
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

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.template.contains("{{context}}"));
        assert!(prompts.rag.template.contains("{{question}}"));
        assert!(prompts.bot.welcome.contains("Árbitros FEXB"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hola {{name}}, tienes {{count}} mensajes.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ana".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hola Ana, tienes 5 mensajes.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "{{b}}".to_string());
        vars.insert("b".to_string(), "{{a}}".to_string());

        assert_eq!(Prompts::render("{{a}}|{{b}}|{{c}}", &vars), "{{b}}|{{a}}|{{c}}");
    }

    #[test]
    fn test_provided_variables_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("federation".to_string(), "FEXB".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "¿Qué es una falta técnica?".to_string());

        let rendered = prompts.render_with_custom("{{federation}}: {{question}}", &vars);
        assert_eq!(rendered, "FEXB: ¿Qué es una falta técnica?");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bot.toml"),
            "welcome = \"Bienvenido\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.bot.welcome, "Bienvenido");
        // Unspecified fields keep their defaults.
        assert_eq!(prompts.bot.status_error, "⚠️ Error con la IA ({{status}})");
        assert!(prompts.rag.template.contains("reglamento"));
    }
}
