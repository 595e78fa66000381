use async_trait::async_trait;
use gloo_net::http::Request;
use web_sys::FormData;

use crate::error::TransportError;

pub const ACCEPT_JSON: &str = "application/json";
pub const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Field values captured at submit time, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormSubmission {
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn to_urlencoded(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn to_form_data(&self) -> Result<FormData, TransportError> {
        let data = FormData::new().map_err(|e| TransportError::Build(format!("{:?}", e)))?;
        for (key, value) in &self.fields {
            data.append_with_str(key, value)
                .map_err(|e| TransportError::Build(format!("{:?}", e)))?;
        }
        Ok(data)
    }
}

// Forms encode spaces as '+', not "%20".
fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}

/// Body encoding, taken from the form's `enctype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormEncoding {
    #[default]
    Multipart,
    UrlEncoded,
}

impl FormEncoding {
    pub fn from_enctype(enctype: &str) -> FormEncoding {
        if enctype.eq_ignore_ascii_case(URLENCODED) {
            FormEncoding::UrlEncoded
        } else {
            FormEncoding::Multipart
        }
    }
}

/// A POST of one submission to the form's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub url: String,
    pub encoding: FormEncoding,
    pub submission: FormSubmission,
}

/// Sends a submission and reports the HTTP status it got back.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: &OutgoingRequest) -> Result<u16, TransportError>;
}

/// Browser `fetch` through gloo-net.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<u16, TransportError> {
        let builder = Request::post(&request.url).header("Accept", ACCEPT_JSON);
        let builder = match request.encoding {
            FormEncoding::Multipart => builder.body(request.submission.to_form_data()?),
            FormEncoding::UrlEncoded => builder
                .header("Content-Type", URLENCODED)
                .body(request.submission.to_urlencoded()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(response.status())
    }
}
