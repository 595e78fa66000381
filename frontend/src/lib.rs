use log::{debug, error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Document;

pub mod config;
pub mod error;
pub mod transport;
pub mod components {
    pub mod contact_form;
    pub mod scroll_reveal;
    pub mod validation;
}
pub mod dom {
    pub mod contact;
    pub mod reveal;
}

#[cfg(test)]
mod test_mocks;

use config::{SiteConfig, CONFIG_ELEMENT_ID};

/// Boots scroll reveal and the contact form once the document is parsed.
pub fn start() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        error!("No document to attach to");
        return;
    };

    if document.ready_state() != "loading" {
        attach(&document);
        return;
    }

    let ready_document = document.clone();
    let on_ready = Closure::once(move || attach(&ready_document));
    if let Err(e) = document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())
    {
        error!("Failed to wait for DOMContentLoaded: {:?}", e);
        return;
    }
    on_ready.forget();
}

fn attach(document: &Document) {
    let config = load_config(document);

    match dom::reveal::init(document, &config.reveal) {
        Ok(count) => debug!("Scroll reveal watching {} section(s)", count),
        Err(e) => error!("Scroll reveal setup failed: {:?}", e),
    }
    match dom::contact::init(document, &config.contact) {
        Ok(attached) => debug!("Contact form attached: {}", attached),
        Err(e) => error!("Contact form setup failed: {:?}", e),
    }

    info!("Website loaded successfully");
}

/// Reads the optional `#site-config` JSON block; anything unusable falls back
/// to the defaults.
pub fn load_config(document: &Document) -> SiteConfig {
    let Some(raw) = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content())
    else {
        return SiteConfig::default();
    };

    match SiteConfig::from_json(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring #{}: {}", CONFIG_ELEMENT_ID, e);
            SiteConfig::default()
        }
    }
}
