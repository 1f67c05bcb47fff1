// src/templates.rs
use log::info;
use minijinja::Environment;
use std::path::Path;
use thiserror::Error;

use crate::models::scoreboard::Scoreboard;

/// The `.html` suffix turns on HTML auto-escaping of player names.
const PAGE: &str = "index.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("reading template: {0}")]
    Io(#[from] std::io::Error),
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let templates = Self::from_source(source)?;
        info!("Loaded page template from {}", path.display());
        Ok(templates)
    }

    pub fn from_source(source: String) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template_owned(PAGE, source)?;
        Ok(Self { env })
    }

    pub fn render_page(&self, board: &Scoreboard) -> Result<String, TemplateError> {
        Ok(self.env.get_template(PAGE)?.render(board)?)
    }
}
