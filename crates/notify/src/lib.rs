//! Alert dispatch for the price monitoring engine.
//!
//! This crate provides:
//! - `AlertSender` trait for pluggable dispatch channels
//! - SMTP email implementation via lettre
//! - Minijinja template rendering for alert subject and body

pub mod email;
pub mod templating;
pub mod traits;

pub use email::EmailAlertSender;
pub use templating::TemplateRenderer;
pub use traits::{AlertSender, NotifyError, PriceDropAlert};
