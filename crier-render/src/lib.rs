//! Placeholder substitution for campaign emails.
//!
//! Templates use `{{variable}}` markers. Rendering substitutes the subject
//! line first, then the HTML body, then splices the body into an optional
//! layout document and resolves any markers the layout itself carries.
//! Markers with no matching variable are left in place untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Marker name a layout uses for the spot where the body is spliced in.
const LAYOUT_CONTENT_VAR: &str = "content";

/// Subject line, HTML body, and optional wrapping layout for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub subject: String,
    pub html_body: String,
    #[serde(default)]
    pub layout: Option<String>,
}

/// The fully substituted message, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html_body: String,
}

/// Replace every `{{name}}` marker in `input` with its value from `vars`.
///
/// Marker names are trimmed, so `{{ name }}` and `{{name}}` resolve the
/// same way. Markers that miss the map, and a `{{` with no closing `}}`,
/// pass through verbatim. Substituted values are not rescanned within a
/// single pass.
#[must_use]
pub fn substitute(input: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let raw = &after_open[..close];
                match vars.get(raw.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(raw);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Render a template for one recipient.
///
/// The substituted subject joins the variable map under `subject` before the
/// body is rendered, so both the body and the layout may reference it. When
/// a layout is present its `{{content}}` marker receives the rendered body,
/// and the assembled document gets one more substitution pass for markers
/// living in the layout itself.
#[must_use]
pub fn render(template: &MessageTemplate, vars: &HashMap<String, String>) -> RenderedMessage {
    let subject = substitute(&template.subject, vars);

    let mut full = vars.clone();
    full.insert("subject".to_string(), subject.clone());

    let body = substitute(&template.html_body, &full);

    let html_body = match &template.layout {
        Some(layout) => {
            let splice = HashMap::from([(LAYOUT_CONTENT_VAR.to_string(), body)]);
            let document = substitute(layout, &splice);
            substitute(&document, &full)
        }
        None => body,
    };

    RenderedMessage { subject, html_body }
}

/// First whitespace-separated token of a name, or the name itself when
/// there is none.
#[must_use]
pub fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

/// Standard per-recipient variable map: `name`, `first_name`, and `email`.
#[must_use]
pub fn recipient_vars(name: &str, email: &str) -> HashMap<String, String> {
    HashMap::from([
        ("name".to_string(), name.to_string()),
        ("first_name".to_string(), first_name(name).to_string()),
        ("email".to_string(), email.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars_for(name: &str, email: &str) -> HashMap<String, String> {
        recipient_vars(name, email)
    }

    #[test]
    fn test_substitute_replaces_known_markers() {
        let vars = vars_for("Ada Lovelace", "ada@example.com");
        let out = substitute("Hi {{first_name}}, mail goes to {{email}}.", &vars);
        assert_eq!(out, "Hi Ada, mail goes to ada@example.com.");
    }

    #[test]
    fn test_substitute_tolerates_padding_inside_markers() {
        let vars = vars_for("Ada Lovelace", "ada@example.com");
        assert_eq!(substitute("{{ name }}", &vars), "Ada Lovelace");
        assert_eq!(substitute("{{  first_name}}", &vars), "Ada");
    }

    #[test]
    fn test_unknown_markers_pass_through_verbatim() {
        let vars = vars_for("Ada Lovelace", "ada@example.com");
        let out = substitute("Hello {{nickname}}!", &vars);
        assert_eq!(out, "Hello {{nickname}}!");
    }

    #[test]
    fn test_unterminated_marker_passes_through() {
        let vars = vars_for("Ada Lovelace", "ada@example.com");
        assert_eq!(substitute("dangling {{name", &vars), "dangling {{name");
        assert_eq!(substitute("{{name}} then {{", &vars), "Ada Lovelace then {{");
    }

    #[test]
    fn test_adjacent_markers() {
        let vars = vars_for("Ada Lovelace", "ada@example.com");
        assert_eq!(substitute("{{first_name}}{{email}}", &vars), "Adaada@example.com");
    }

    #[test]
    fn test_render_without_layout() {
        let template = MessageTemplate {
            subject: "Welcome, {{first_name}}".to_string(),
            html_body: "<p>Hello {{name}}</p>".to_string(),
            layout: None,
        };
        let rendered = render(&template, &vars_for("Ada Lovelace", "ada@example.com"));
        assert_eq!(rendered.subject, "Welcome, Ada");
        assert_eq!(rendered.html_body, "<p>Hello Ada Lovelace</p>");
    }

    #[test]
    fn test_body_may_reference_the_rendered_subject() {
        let template = MessageTemplate {
            subject: "Hi {{first_name}}".to_string(),
            html_body: "<h1>{{subject}}</h1>".to_string(),
            layout: None,
        };
        let rendered = render(&template, &vars_for("Ada Lovelace", "ada@example.com"));
        assert_eq!(rendered.html_body, "<h1>Hi Ada</h1>");
    }

    #[test]
    fn test_layout_wraps_body_and_resolves_its_own_markers() {
        let template = MessageTemplate {
            subject: "News for {{first_name}}".to_string(),
            html_body: "<p>{{name}}, you are in.</p>".to_string(),
            layout: Some("<html><title>{{subject}}</title><body>{{content}}</body></html>".to_string()),
        };
        let rendered = render(&template, &vars_for("Ada Lovelace", "ada@example.com"));
        assert_eq!(
            rendered.html_body,
            "<html><title>News for Ada</title><body><p>Ada Lovelace, you are in.</p></body></html>"
        );
    }

    #[test]
    fn test_content_marker_in_body_is_not_respliced() {
        let template = MessageTemplate {
            subject: "s".to_string(),
            html_body: "literal {{content}} stays".to_string(),
            layout: Some("[{{content}}]".to_string()),
        };
        let rendered = render(&template, &vars_for("Ada Lovelace", "ada@example.com"));
        assert_eq!(rendered.html_body, "[literal {{content}} stays]");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = MessageTemplate {
            subject: "{{first_name}} {{missing}}".to_string(),
            html_body: "{{email}} {{also_missing}}".to_string(),
            layout: Some("<div>{{content}}</div>".to_string()),
        };
        let vars = vars_for("Grace Hopper", "grace@example.com");
        let first = render(&template, &vars);
        let second = render(&template, &vars);
        assert_eq!(first, second);
        assert_eq!(first.subject, "Grace {{missing}}");
        assert_eq!(first.html_body, "<div>grace@example.com {{also_missing}}</div>");
    }

    #[test]
    fn test_first_name_token_rules() {
        assert_eq!(first_name("Grace Hopper"), "Grace");
        assert_eq!(first_name("Prince"), "Prince");
        assert_eq!(first_name(""), "");
        assert_eq!(first_name("  padded  out  "), "padded");
    }

    #[test]
    fn test_recipient_vars_carry_all_three_keys() {
        let vars = recipient_vars("Grace Hopper", "grace@example.com");
        assert_eq!(vars.get("name").map(String::as_str), Some("Grace Hopper"));
        assert_eq!(vars.get("first_name").map(String::as_str), Some("Grace"));
        assert_eq!(vars.get("email").map(String::as_str), Some("grace@example.com"));
    }

    #[test]
    fn test_template_field_names_are_stable_in_serde() {
        let json = serde_json::json!({
            "subject": "s",
            "html_body": "<b>b</b>",
        });
        let template: MessageTemplate =
            serde_json::from_value(json).expect("decode template without layout");
        assert!(template.layout.is_none());

        let with_layout: MessageTemplate = serde_json::from_value(serde_json::json!({
            "subject": "s",
            "html_body": "b",
            "layout": "<div>{{content}}</div>",
        }))
        .expect("decode template with layout");
        assert_eq!(with_layout.layout.as_deref(), Some("<div>{{content}}</div>"));
    }
}
