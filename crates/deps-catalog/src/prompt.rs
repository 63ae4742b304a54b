use std::sync::Arc;

use async_trait::async_trait;
use deps_core::{PromptStrategy, UserInterface};

use crate::schema::PromptDefinition;

/// Confirmation dialog built from a feature's `[feature.prompt]` text.
pub struct TemplatePrompt {
    definition: PromptDefinition,
    action: String,
    ui: Arc<dyn UserInterface>,
}

impl TemplatePrompt {
    pub fn new(
        definition: PromptDefinition,
        action: impl Into<String>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            definition,
            action: action.into(),
            ui,
        }
    }

    /// `(title, message)` with placeholders filled in.
    pub fn render(&self, unsatisfied: &str) -> (String, String) {
        let fill = |text: &str| {
            text.replace("{action}", &self.action)
                .replace("{packages}", unsatisfied)
        };
        (fill(&self.definition.title), fill(&self.definition.message))
    }
}

#[async_trait]
impl PromptStrategy for TemplatePrompt {
    async fn prompt(&self, unsatisfied: &str) -> bool {
        let (title, message) = self.render(unsatisfied);
        self.ui.confirm(&title, &message).await
    }
}
