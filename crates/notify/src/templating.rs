//! Minijinja template rendering for alert emails.
//!
//! Renders subject and body templates with the [`PriceDropAlert`] fields
//! as context. Templates are arbitrary strings (operators can override
//! them), so a fresh [`minijinja::Environment`] is created per render call.

use crate::traits::{NotifyError, PriceDropAlert};

/// Default subject template for price-drop emails.
pub const DEFAULT_SUBJECT_TEMPLATE: &str =
    "Price drop: {{ product_title }} is now {{ current_price | money }}";

/// Default body template for price-drop emails.
pub const DEFAULT_BODY_TEMPLATE: &str = "\
{{ product_title }} dropped to {{ current_price | money }}.
{% if target_price %}Your target price: {{ target_price | money }}.
{% endif %}{% if percentage_threshold %}Your alert threshold: {{ percentage_threshold | round(0) }}% below the list price{% if original_price %} of {{ original_price | money }}{% endif %}.
{% endif %}Lowest price we have seen: {{ lowest_price | money }}.
{% if product_url %}{{ product_url }}
{% endif %}";

/// Renders alert templates using minijinja.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    subject_template: String,
    body_template: String,
}

impl TemplateRenderer {
    /// Create a renderer with the default subject/body templates.
    pub fn new() -> Self {
        Self {
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }

    /// Create a renderer with custom templates.
    pub fn with_templates(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject_template: subject.into(),
            body_template: body.into(),
        }
    }

    /// Build a configured minijinja environment with custom filters.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("money", money_filter);
        env.add_filter("round", round_filter);
        env
    }

    /// Render the subject line for an alert.
    pub fn render_subject(&self, alert: &PriceDropAlert) -> Result<String, NotifyError> {
        Self::render(&self.subject_template, alert)
    }

    /// Render the message body for an alert.
    pub fn render_body(&self, alert: &PriceDropAlert) -> Result<String, NotifyError> {
        Self::render(&self.body_template, alert)
    }

    /// Render a template string with the alert as context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(template_str: &str, alert: &PriceDropAlert) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, alert)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Validate that a template string parses without errors.
    ///
    /// This does not evaluate the template — it only checks syntax.
    pub fn validate(template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom filter: format a price with two decimal places.
fn money_filter(value: f64) -> String {
    format!("${:.2}", value)
}

/// Custom filter: round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}
