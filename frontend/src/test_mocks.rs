use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::components::contact_form::{ContactForm, FormSurface, StatusLine, SubmitButton};
use crate::components::validation::{Field, FieldKind};
use crate::config::ContactConfig;
use crate::error::TransportError;
use crate::transport::{FormEncoding, OutgoingRequest, Transport};

/// Everything the mocks saw, in the order they saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Button { disabled: bool, label: String },
    Status(StatusLine),
    Field { index: usize, value: String, invalid: bool },
    Dispatched,
    Sent(OutgoingRequest),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// name (required), email (required, email), message (required).
pub fn contact_form(config: ContactConfig) -> ContactForm {
    ContactForm::new(
        "https://formspree.io/f/test",
        FormEncoding::Multipart,
        vec![
            Field::new("name", FieldKind::Text, true),
            Field::new("email", FieldKind::Email, true),
            Field::new("message", FieldKind::TextArea, true),
        ],
        config,
    )
}

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Fail(TransportError),
    /// Never resolves.
    Hang,
}

pub struct MockTransport {
    log: EventLog,
    reply: Reply,
    form: Option<Rc<RefCell<ContactForm>>>,
    edit: Option<(usize, String)>,
    seen_button: RefCell<Option<SubmitButton>>,
}

impl MockTransport {
    pub fn new(log: EventLog, reply: Reply) -> Self {
        Self {
            log,
            reply,
            form: None,
            edit: None,
            seen_button: RefCell::new(None),
        }
    }

    /// Record the form's submit button as it is when the request goes out.
    pub fn observing(mut self, form: Rc<RefCell<ContactForm>>) -> Self {
        self.form = Some(form);
        self
    }

    /// Type into field `index` while the request is in flight.
    pub fn editing(mut self, form: Rc<RefCell<ContactForm>>, index: usize, value: &str) -> Self {
        self.form = Some(form);
        self.edit = Some((index, value.to_string()));
        self
    }

    pub fn seen_button(&self) -> Option<SubmitButton> {
        self.seen_button.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<u16, TransportError> {
        self.log.borrow_mut().push(Event::Dispatched);
        self.log.borrow_mut().push(Event::Sent(request.clone()));

        if let Some(form) = &self.form {
            let mut state = form.borrow_mut();
            *self.seen_button.borrow_mut() = Some(state.button().clone());
            if let Some((index, value)) = &self.edit {
                state.input(*index, value);
            }
        }

        match &self.reply {
            Reply::Status(status) => Ok(*status),
            Reply::Fail(e) => Err(e.clone()),
            Reply::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

pub struct RecordingSurface {
    log: EventLog,
}

impl RecordingSurface {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl FormSurface for RecordingSurface {
    fn render_button(&self, button: &SubmitButton) {
        self.log.borrow_mut().push(Event::Button {
            disabled: button.disabled,
            label: button.label.clone(),
        });
    }

    fn render_status(&self, status: &StatusLine) {
        self.log.borrow_mut().push(Event::Status(status.clone()));
    }

    fn render_field(&self, index: usize, field: &Field) {
        self.log.borrow_mut().push(Event::Field {
            index,
            value: field.value.clone(),
            invalid: field.invalid,
        });
    }
}
