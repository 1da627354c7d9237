//! Notification templates
//!
//! Built-in Tera templates for the message sent after a ticket is created.
//! Any of them can be replaced by a file of the same name in a template
//! directory. `.html` templates are autoescaped, so reporter-supplied text
//! cannot inject markup.

use crate::core::Ticket;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

pub const CREATED_SUBJECT: &str = "ticket_created_subject.txt";
pub const CREATED_TEXT: &str = "ticket_created.txt";
pub const CREATED_HTML: &str = "ticket_created.html";

const BUILTIN: [(&str, &str); 3] = [
    (
        CREATED_SUBJECT,
        "Lost & Found ticket {{ reference }} created",
    ),
    (
        CREATED_TEXT,
        r"Hi {{ reporter | default(value='there') }},

Your lost & found ticket {{ reference }} has been created.
{% for item in items %}
  - {{ item.name }}{% if item.description %}: {{ item.description }}{% endif %}
{%- endfor %}

Track it here: {{ tracking_url }}
Tracking code: {{ tracking_code }}
",
    ),
    (
        CREATED_HTML,
        r#"<p>Hi {{ reporter | default(value="there") }},</p>
<p>Your lost &amp; found ticket <strong>{{ reference }}</strong> has been created.</p>
<ul>
{% for item in items %}  <li>{{ item.name }}{% if item.description %}: {{ item.description }}{% endif %}</li>
{% endfor %}</ul>
<p>Track your ticket here: <a href="{{ tracking_url }}">{{ tracking_url }}</a></p>
<p>Tracking code: <code>{{ tracking_code }}</code></p>
"#,
    ),
];

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

/// Rendered subject and bodies for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders notification templates
#[derive(Debug)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Renderer with the built-in templates only
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN.to_vec())?;
        Ok(Self { tera })
    }

    /// Renderer whose built-ins are overridden by files found in `dir`
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut renderer = Self::new()?;
        for (name, _) in BUILTIN {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!(template = name, path = %path.display(), "using template override");
                renderer.tera.add_template_file(&path, Some(name))?;
            }
        }
        Ok(renderer)
    }

    /// Render the "ticket created" message
    pub fn render_created(
        &self,
        ticket: &Ticket,
        tracking_url: &str,
        tracking_code: &str,
    ) -> Result<RenderedMessage> {
        let items: Vec<ItemView<'_>> = ticket
            .items
            .iter()
            .map(|item| ItemView {
                name: &item.name,
                description: item.description.as_deref(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("reference", &ticket.display_ref());
        if let Some(reporter) = &ticket.reporter_name {
            context.insert("reporter", reporter);
        }
        context.insert("items", &items);
        context.insert("tracking_url", tracking_url);
        context.insert("tracking_code", tracking_code);

        Ok(RenderedMessage {
            subject: self.tera.render(CREATED_SUBJECT, &context)?.trim().to_string(),
            text: self.tera.render(CREATED_TEXT, &context)?,
            html: self.tera.render(CREATED_HTML, &context)?,
        })
    }
}
