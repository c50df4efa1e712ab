use std::path::PathBuf;

/// Template error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template file does not exist.
    #[error("Template file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// Template failed to load or render.
    #[error("Template rendering failed: {0}")]
    Render(#[from] minijinja::Error),

    /// Rendered output is not JSON.
    #[error("Rendered template is not valid JSON: {source}")]
    InvalidJson {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
        /// Parser error.
        source: serde_json::Error,
    },

    /// Rendered JSON is not an object.
    #[error("Template must render to a JSON object at the top level")]
    NotAnObject,

    /// `--var` value without `=`.
    #[error("Invalid --var assignment '{0}'. Use key=value.")]
    InvalidAssignment(String),

    /// `--var` value with an empty name.
    #[error("Variable names must not be empty")]
    EmptyVariableName,
}

impl From<serde_json::Error> for TemplateError {
    fn from(source: serde_json::Error) -> Self {
        Self::InvalidJson {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
