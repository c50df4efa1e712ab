//! Jinja payload templates for hookcast.
//!
//! A template is a Jinja file that renders to a JSON object: the webhook
//! payload. Rendering is strict about undefined variables and never escapes
//! output, so templates are responsible for quoting (the `tojson` filter
//! does this).
//!
//! Every template can call the embed helpers `embed_footer`, `embed_field`
//! and `embed_timestamp`.
//!
//! # Example
//!
//! ```ignore
//! use hookcast_template::{build_template_context, parse_var_assignments, render_template};
//!
//! let vars = parse_var_assignments(&["service=api"])?;
//! let context = build_template_context("Deployed", false, &env, &vars, Default::default());
//! let payload = render_template(Path::new("templates/deploy.json.j2"), &context)?;
//! ```

mod context;
mod error;
mod helpers;
mod render;

pub use context::{TemplateContext, build_template_context, parse_var_assignments};
pub use error::TemplateError;
pub use render::render_template;
