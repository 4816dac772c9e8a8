//! Text templating for commit messages and comments.
//!
//! Templates use `{{name}}` placeholders rendered by Handlebars. Output is
//! markdown, so HTML escaping is off. Unknown variables render empty.

use handlebars::Handlebars;
use serde_json::Value;

use crate::domain::TemplateError;

/// Compile `template` without rendering it.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    let mut hb = Handlebars::new();
    hb.register_template_string("template", template)?;
    Ok(())
}

/// Render `template` with `vars`.
pub fn format(template: &str, vars: &Value) -> Result<String, TemplateError> {
    let mut hb = Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    Ok(hb.render_template(template, vars)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitutes_variables() {
        let out = format(
            "Optimize {{optimizedCount}} SVG(s) with SVGO",
            &json!({ "optimizedCount": 3 }),
        )
        .unwrap();
        assert_eq!(out, "Optimize 3 SVG(s) with SVGO");
    }

    #[test]
    fn test_markdown_is_not_escaped() {
        let out = format(
            "{{filesTable}}",
            &json!({ "filesTable": "| a.svg | 1 KB | <b> & more |" }),
        )
        .unwrap();
        assert_eq!(out, "| a.svg | 1 KB | <b> & more |");
    }

    #[test]
    fn test_unknown_variable_renders_empty() {
        let out = format("[{{nope}}]", &json!({})).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_malformed_template_is_an_error() {
        assert!(format("{{#if}}", &json!({})).is_err());
    }

    #[test]
    fn test_validate_compiles_without_vars() {
        validate("Optimize {{optimizedCount}} SVG(s)").unwrap();
        validate("{{#if warnings}}{{warnings}}{{/if}}").unwrap();
        assert!(matches!(
            validate("Saved {{#if}}"),
            Err(TemplateError::Syntax(_))
        ));
    }
}
