// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds prompts by reading a per-step template file and substituting
//! the item id. Template files live at `<prompts_dir>/<step>.md`.

use deespec_core::step::Step;
use deespec_engine::{PromptBuilder, PromptError};
use std::path::PathBuf;

pub struct FilePromptBuilder {
    prompts_dir: PathBuf,
}

impl FilePromptBuilder {
    pub fn new(prompts_dir: PathBuf) -> Self {
        Self { prompts_dir }
    }
}

impl PromptBuilder for FilePromptBuilder {
    fn build_prompt(&self, item_id: &str, step: Step) -> Result<String, PromptError> {
        let path = self.prompts_dir.join(format!("{}.md", step.as_str()));
        let template = std::fs::read_to_string(&path).map_err(|_| PromptError::NoTemplate(step))?;
        Ok(template.replace("{{item_id}}", item_id))
    }
}
