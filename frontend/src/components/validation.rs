use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

pub const INVALID_CLASS: &str = "invalid";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    TextArea,
    Hidden,
    Checkbox,
    Radio,
    Select,
}

impl FieldKind {
    /// Maps an `<input type>` attribute. Button-like inputs carry no data and
    /// yield `None`.
    pub fn from_input_type(input_type: &str) -> Option<FieldKind> {
        match input_type.to_ascii_lowercase().as_str() {
            "email" => Some(FieldKind::Email),
            "hidden" => Some(FieldKind::Hidden),
            "checkbox" => Some(FieldKind::Checkbox),
            "radio" => Some(FieldKind::Radio),
            "submit" | "button" | "reset" | "image" => None,
            _ => Some(FieldKind::Text),
        }
    }

    /// Checkboxes and radios only contribute while checked.
    pub fn is_checkable(self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

/// View-model for one form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub default_value: String,
    pub checked: bool,
    pub default_checked: bool,
    pub disabled: bool,
    pub invalid: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            value: String::new(),
            default_value: String::new(),
            checked: false,
            default_checked: false,
            disabled: false,
            invalid: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Value the page was served with; a reset goes back to it.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self.value = self.default_value.clone();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self.default_checked = checked;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Whether the control ends up in the request body, following the
    /// browser's form data rules.
    pub fn is_submitted(&self) -> bool {
        !self.name.is_empty() && !self.disabled && (!self.kind.is_checkable() || self.checked)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.required && self.value.trim().is_empty() {
            return Err(ValidationError::Required { field: self.name.clone() });
        }
        // Untrimmed on purpose: whitespace in an email field is a bad address.
        if self.kind == FieldKind::Email && !self.value.is_empty() && !is_valid_email(&self.value) {
            return Err(ValidationError::InvalidEmail { field: self.name.clone() });
        }
        Ok(())
    }

    /// Focus left the field: re-check it and update the marker.
    pub fn on_blur(&mut self) -> Result<(), ValidationError> {
        let result = self.validate();
        self.invalid = result.is_err();
        result
    }

    /// The user typed. Clears the marker without re-validating; returns
    /// whether the marker changed.
    pub fn on_input(&mut self, value: impl Into<String>) -> bool {
        self.value = value.into();
        std::mem::replace(&mut self.invalid, false)
    }

    /// Back to the served defaults with no invalid marker, like `form.reset()`.
    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
        self.checked = self.default_checked;
        self.invalid = false;
    }
}
