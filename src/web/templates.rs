use axum::response::Html;
use minijinja::{Environment, UndefinedBehavior, Value};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;

use crate::error::WordgateError;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

// Parsing the embedded templates can only fail on a bad build, so the panics
// here are startup assertions, not request-time failures.
static ENVIRONMENT: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();

    // Pages render with partial context (an error list and nothing else), so
    // attribute access on missing values must stay silent.
    env.set_undefined_behavior(UndefinedBehavior::Chainable);

    for name in Templates::iter() {
        let file = Templates::get(&name).expect("embedded template listed but missing");
        let source = String::from_utf8_lossy(file.data.as_ref()).into_owned();

        env.add_template_owned(name.to_string(), source)
            .expect("embedded template failed to parse");
    }

    env
});

pub fn render(name: &str, ctx: Value) -> Result<Html<String>, WordgateError> {
    let template = ENVIRONMENT.get_template(name)?;

    Ok(Html(template.render(ctx)?))
}
