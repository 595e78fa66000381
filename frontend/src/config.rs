use log::Level;
use serde::Deserialize;

use crate::components::scroll_reveal::RevealPolicy;
use crate::error::ConfigError;

/// Id of the optional inline JSON block a page can use to override defaults.
pub const CONFIG_ELEMENT_ID: &str = "site-config";

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug  // Verbose while developing locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub reveal: RevealConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevealConfig {
    pub selector: String,
    pub threshold: f64,
    pub policy: RevealPolicy,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: "section".to_string(),
            threshold: 0.1,
            policy: RevealPolicy::ClassToggle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactConfig {
    pub form_id: String,
    pub submit_selector: String,
    pub status_id: String,
    pub submit_label: String,
    pub sending_label: String,
    pub success_message: String,
    pub error_message: String,
    /// Refuse to send while any field fails validation. Off by default: the
    /// invalid markers are advisory only.
    pub block_on_invalid: bool,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            form_id: "contact-form".to_string(),
            submit_selector: ".submit-btn".to_string(),
            status_id: "form-status".to_string(),
            submit_label: "Send Message".to_string(),
            sending_label: "Sending...".to_string(),
            success_message: "Thank you! Your message has been sent successfully. I'll get back to you soon.".to_string(),
            error_message: "Oops! There was a problem sending your message. Please try again or contact me directly via email.".to_string(),
            block_on_invalid: false,
        }
    }
}

impl SiteConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.reveal.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        let required = [
            ("reveal.selector", &self.reveal.selector),
            ("contact.formId", &self.contact.form_id),
            ("contact.submitSelector", &self.contact.submit_selector),
            ("contact.statusId", &self.contact.status_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        Ok(())
    }
}
