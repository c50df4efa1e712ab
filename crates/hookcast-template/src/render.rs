use std::path::Path;

use minijinja::{AutoEscape, Environment, UndefinedBehavior, path_loader};
use serde_json::Value;
use tracing::debug;

use crate::context::TemplateContext;
use crate::error::TemplateError;
use crate::helpers;

/// Render a template file into a JSON payload object.
///
/// Templates are loaded relative to the template's directory, so `include`
/// and `import` resolve against neighbouring files. Undefined variables are
/// errors and output is not escaped.
///
/// # Errors
///
/// Returns [`TemplateError`] if the file is missing, rendering fails, or the
/// output is not a JSON object.
pub fn render_template(
    template_path: &Path,
    context: &TemplateContext,
) -> Result<serde_json::Map<String, Value>, TemplateError> {
    let name = template_path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| template_path.is_file())
        .ok_or_else(|| TemplateError::NotFound(template_path.to_path_buf()))?;
    let dir = template_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let env = build_environment(dir);
    let rendered = env
        .get_template(name)
        .and_then(|template| template.render(context))
        .inspect_err(|err| debug!("Template rendering failed: {err:#}"))?;

    match serde_json::from_str::<Value>(&rendered)? {
        Value::Object(payload) => Ok(payload),
        _ => Err(TemplateError::NotAnObject),
    }
}

fn build_environment(dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(dir));
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    helpers::register(&mut env);
    env
}
