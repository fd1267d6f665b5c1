//! Template rendering
//!
//! Templates are embedded at compile time so the binary renders without a
//! working directory dependency; the `static/` directory is still served
//! as-is for assets.

use crate::error::Result;
use serde_json::Value;
use tera::{Context, Tera};

/// Build the template registry
pub fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (
            "homepage.html",
            include_str!("../../static/templates/homepage.html"),
        ),
        (
            "generator.html",
            include_str!("../../static/templates/generator.html"),
        ),
        (
            "error.html",
            include_str!("../../static/templates/error.html"),
        ),
    ])?;
    Ok(tera)
}

/// Render the home page
pub fn render_home(tera: &Tera) -> Result<String> {
    let mut context = Context::new();
    context.insert("title", "Mailwalk Generator");
    Ok(tera.render("homepage.html", &context)?)
}

/// Render one mail item pulled from the pager
pub fn render_item(tera: &Tera, item: &Value) -> Result<String> {
    let mut context = Context::new();
    context.insert("done", &false);
    context.insert(
        "subject",
        item.get("subject")
            .and_then(Value::as_str)
            .unwrap_or("(no subject)"),
    );
    context.insert(
        "received",
        item.get("receivedDateTime")
            .and_then(Value::as_str)
            .unwrap_or(""),
    );
    context.insert("item", &serde_json::to_string_pretty(item)?);
    Ok(tera.render("generator.html", &context)?)
}

/// Render the end-of-collection view
pub fn render_done(tera: &Tera) -> Result<String> {
    let mut context = Context::new();
    context.insert("done", &true);
    Ok(tera.render("generator.html", &context)?)
}

/// Render the error page
pub fn render_error(tera: &Tera, message: &str) -> Result<String> {
    let mut context = Context::new();
    context.insert("message", message);
    Ok(tera.render("error.html", &context)?)
}
