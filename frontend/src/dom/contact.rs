use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement,
};

use crate::components::contact_form::{
    submit, ContactForm, FormSurface, StatusLine, SubmitButton,
};
use crate::components::validation::{Field, FieldKind, INVALID_CLASS};
use crate::config::ContactConfig;
use crate::transport::{FormEncoding, GlooTransport};

const CONTROL_SELECTOR: &str = "input, textarea, select";

/// Renders the contact form view-model onto the page.
pub struct DomSurface {
    form: HtmlFormElement,
    fields: Vec<Element>,
    button: Option<Element>,
    status: Option<HtmlElement>,
}

impl DomSurface {
    /// `fields` must be in the same order as the view-model's fields.
    pub fn new(
        form: HtmlFormElement,
        fields: Vec<Element>,
        button: Option<Element>,
        status: Option<HtmlElement>,
    ) -> Self {
        Self { form, fields, button, status }
    }
}

impl FormSurface for DomSurface {
    fn render_button(&self, button: &SubmitButton) {
        let Some(element) = &self.button else {
            return;
        };
        if let Err(e) = element.toggle_attribute_with_force("disabled", button.disabled) {
            warn!("Failed to toggle submit button: {:?}", e);
        }
        // <input type="submit"> shows its value, <button> its text.
        match element.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.set_value(&button.label),
            None => element.set_text_content(Some(&button.label)),
        }
    }

    fn render_status(&self, status: &StatusLine) {
        let Some(element) = &self.status else {
            return;
        };
        if status.visible {
            element.set_text_content(Some(&status.text));
            element.set_class_name(&status.class);
        }
        let display = if status.visible { "block" } else { "none" };
        if let Err(e) = element.style().set_property("display", display) {
            warn!("Failed to update form status: {:?}", e);
        }
    }

    fn render_field(&self, index: usize, field: &Field) {
        let Some(element) = self.fields.get(index) else {
            return;
        };
        if field.kind.is_checkable() {
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                input.set_checked(field.checked);
            }
        } else if control_value(element) != field.value {
            set_control_value(element, &field.value);
        }
        mark_invalid(element, field);
    }

    // The browser knows the served defaults better than we do, selects included.
    fn render_reset(&self, fields: &[Field]) {
        self.form.reset();
        for (element, field) in self.fields.iter().zip(fields) {
            mark_invalid(element, field);
        }
    }
}

/// Wires up the contact form if the page has one. Returns whether it did.
pub fn init(document: &Document, config: &ContactConfig) -> Result<bool, JsValue> {
    let Some(element) = document.get_element_by_id(&config.form_id) else {
        debug!("No #{} on this page", config.form_id);
        return Ok(false);
    };
    let form_element: HtmlFormElement = element.dyn_into()?;

    let button = form_element.query_selector(&config.submit_selector)?;
    if button.is_none() {
        warn!("Contact form has no `{}` control", config.submit_selector);
    }
    let status = document
        .get_element_by_id(&config.status_id)
        .and_then(|e| e.dyn_into::<HtmlElement>().ok());
    if status.is_none() {
        warn!("No #{} element for form status", config.status_id);
    }

    let (elements, fields): (Vec<Element>, Vec<Field>) = collect_controls(&form_element)?.into_iter().unzip();
    // The raw attribute, not the `enctype` property: a form without one is
    // posted as multipart like `new FormData(form)` would be.
    let encoding = FormEncoding::from_enctype(
        &form_element.get_attribute("enctype").unwrap_or_default(),
    );

    let form = Rc::new(RefCell::new(ContactForm::new(
        form_element.action(),
        encoding,
        fields,
        config.clone(),
    )));
    let surface = Rc::new(DomSurface::new(form_element.clone(), elements, button, status));

    for (index, element) in surface.fields.iter().enumerate() {
        let (blur_form, blur_surface) = (form.clone(), surface.clone());
        listen(element, "blur", move |_| {
            let Ok(mut state) = blur_form.try_borrow_mut() else {
                return;
            };
            let value = control_value(&blur_surface.fields[index]);
            if let Some(Err(e)) = state.blur(index, &value) {
                debug!("{}", e);
            }
            if let Some(field) = state.fields().get(index) {
                blur_surface.render_field(index, field);
            }
        })?;

        let (input_form, input_surface) = (form.clone(), surface.clone());
        listen(element, "input", move |_| {
            let Ok(mut state) = input_form.try_borrow_mut() else {
                return;
            };
            let element = &input_surface.fields[index];
            if let Some(field) = state.field_mut(index) {
                field.checked = control_checked(element);
            }
            if state.input(index, &control_value(element)) {
                if let Some(field) = state.fields().get(index) {
                    input_surface.render_field(index, field);
                }
            }
        })?;
    }

    let field_count = surface.fields.len();
    listen(&form_element, "submit", move |event: Event| {
        event.prevent_default();
        {
            let Ok(mut state) = form.try_borrow_mut() else {
                warn!("Contact form busy, ignoring submit");
                return;
            };
            // Autofill and script changes fire no input events; take what
            // the page shows.
            for (index, element) in surface.fields.iter().enumerate() {
                if let Some(field) = state.field_mut(index) {
                    sync_field(field, element);
                }
            }
        }

        let form = form.clone();
        let surface = surface.clone();
        spawn_local(async move {
            let status = submit(&form, &GlooTransport, &*surface).await;
            debug!("Contact form settled: {:?}", status);
        });
    })?;

    info!("Contact form ready with {} field(s)", field_count);
    Ok(true)
}

fn collect_controls(form: &HtmlFormElement) -> Result<Vec<(Element, Field)>, JsValue> {
    let nodes = form.query_selector_all(CONTROL_SELECTOR)?;
    let controls = (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .filter_map(|element| {
            let kind = if element.is_instance_of::<HtmlTextAreaElement>() {
                FieldKind::TextArea
            } else if element.is_instance_of::<HtmlSelectElement>() {
                FieldKind::Select
            } else {
                FieldKind::from_input_type(&element.get_attribute("type").unwrap_or_default())?
            };
            let name = element.get_attribute("name").unwrap_or_default();
            let mut field = Field::new(name, kind, element.has_attribute("required"))
                .with_default(control_default(&element))
                .with_checked(control_default_checked(&element));
            sync_field(&mut field, &element);
            Some((element, field))
        })
        .collect();
    Ok(controls)
}

fn sync_field(field: &mut Field, element: &Element) {
    field.value = control_value(element);
    field.checked = control_checked(element);
    field.disabled = control_disabled(element);
}

fn mark_invalid(element: &Element, field: &Field) {
    if let Err(e) = element.class_list().toggle_with_force(INVALID_CLASS, field.invalid) {
        warn!("Failed to mark field `{}`: {:?}", field.name, e);
    }
}

fn control_value(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else {
        String::new()
    }
}

fn control_default(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.default_value()
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.default_value().unwrap_or_default()
    } else {
        control_value(element)
    }
}

fn control_checked(element: &Element) -> bool {
    element.dyn_ref::<HtmlInputElement>().is_some_and(|input| input.checked())
}

fn control_default_checked(element: &Element) -> bool {
    element
        .dyn_ref::<HtmlInputElement>()
        .is_some_and(|input| input.default_checked())
}

fn control_disabled(element: &Element) -> bool {
    // Also covers controls inside a disabled <fieldset>.
    element.matches(":disabled").unwrap_or(false)
}

fn set_control_value(element: &Element, value: &str) {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    }
}

fn listen<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
