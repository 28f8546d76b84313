//! Localization templates and markup escaping.

use std::collections::HashMap;

/// Template for a normal radio line.
pub const RADIO_WRAP: &str = "chat-radio-message-wrap";
/// Template for an emphasized radio line.
pub const RADIO_WRAP_BOLD: &str = "chat-radio-message-wrap-bold";
/// Job title shown on synthetic chassis badges.
pub const JOB_NAME_BORG: &str = "job-name-borg";
/// Job title shown on ship-AI badges.
pub const JOB_NAME_STATION_AI: &str = "job-name-station-ai";

/// Turns template ids plus named parameters into display text.
pub trait Localizer: Send + Sync {
    /// Format `template` with `params`. Unknown templates render as their id.
    fn format(&self, template: &str, params: &[(&str, &str)]) -> String;
}

/// Escape markup so user text renders literally.
#[must_use]
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '[' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// In-memory `{param}` templates.
#[derive(Debug, Clone)]
pub struct TemplateLocalizer {
    templates: HashMap<String, String>,
}

impl TemplateLocalizer {
    /// Create a localizer with no templates.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add or replace a template.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(id.into(), template.into());
        self
    }
}

impl Default for TemplateLocalizer {
    fn default() -> Self {
        Self::empty()
            .with(
                RADIO_WRAP,
                "[color={color}]{channel} {name} {verb}, [font=\"{fontType}\" size={fontSize}]\"{message}\"[/font][/color]",
            )
            .with(
                RADIO_WRAP_BOLD,
                "[color={color}]{channel} {name} {verb}, [font=\"{fontType}\" size={fontSize}][bold]\"{message}\"[/bold][/font][/color]",
            )
            .with(JOB_NAME_BORG, "Cyborg")
            .with(JOB_NAME_STATION_AI, "Station AI")
    }
}

impl Localizer for TemplateLocalizer {
    fn format(&self, template: &str, params: &[(&str, &str)]) -> String {
        let Some(source) = self.templates.get(template) else {
            return template.to_string();
        };

        let mut out = String::with_capacity(source.len());
        let mut rest = source.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match params.iter().find(|(name, _)| *name == key) {
                        Some((_, value)) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
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
}
