use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::Array;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::components::scroll_reveal::{IntersectionSample, RevealEffect, ScrollReveal};
use crate::config::RevealConfig;

/// Hides every section present right now and reveals each one the first time
/// enough of it scrolls into view. Returns how many sections are observed.
pub fn init(document: &Document, config: &RevealConfig) -> Result<usize, JsValue> {
    let nodes = document.query_selector_all(&config.selector)?;
    let sections: Vec<Element> = (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect();

    if sections.is_empty() {
        debug!("No `{}` elements to reveal", config.selector);
        return Ok(0);
    }

    for section in &sections {
        apply(section, &config.policy.prepare_effects());
    }

    let sections = Rc::new(sections);
    let state = Rc::new(RefCell::new(ScrollReveal::new(
        sections.len(),
        config.threshold,
        config.policy,
    )));

    let callback = {
        let sections = sections.clone();
        Closure::wrap(Box::new(move |entries: Array, observer: IntersectionObserver| {
            let samples: Vec<IntersectionSample> = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .filter_map(|entry| {
                    let target = entry.target();
                    let index = sections.iter().position(|s| *s == target)?;
                    Some(IntersectionSample {
                        index,
                        ratio: entry.intersection_ratio(),
                        is_intersecting: entry.is_intersecting(),
                    })
                })
                .collect();

            let mut reveal = state.borrow_mut();
            let effects = reveal.policy().reveal_effects();
            for index in reveal.observe(&samples) {
                let section = &sections[index];
                apply(section, &effects);
                observer.unobserve(section);
            }
            debug!("{}/{} sections revealed", reveal.revealed_count(), reveal.len());
        }) as Box<dyn FnMut(Array, IntersectionObserver)>)
    };

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(config.threshold));
    let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
    for section in sections.iter() {
        observer.observe(section);
    }
    // The observer lives as long as the page.
    callback.forget();

    info!("Observing {} section(s) for scroll reveal", sections.len());
    Ok(sections.len())
}

fn apply(section: &Element, effects: &[RevealEffect]) {
    for effect in effects {
        let result = match effect {
            RevealEffect::AddClass(class) => section.class_list().add_1(class),
            RevealEffect::SetStyle(property, value) => match section.dyn_ref::<HtmlElement>() {
                Some(element) => element.style().set_property(property, value),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!("Failed to apply {:?} to section: {:?}", effect, e);
        }
    }
}
