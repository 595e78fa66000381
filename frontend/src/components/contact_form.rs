use std::cell::RefCell;

use log::{debug, error, info, warn};

use crate::components::validation::Field;
use crate::config::ContactConfig;
use crate::error::{SubmitError, ValidationError};
use crate::transport::{FormEncoding, FormSubmission, OutgoingRequest, Transport};

pub const STATUS_SUCCESS_CLASS: &str = "form-status success";
pub const STATUS_ERROR_CLASS: &str = "form-status error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Sending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub disabled: bool,
    pub label: String,
}

/// What the status element shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub visible: bool,
    pub text: String,
    pub class: String,
}

/// Where the contact form's state gets drawn. The browser implementation
/// writes to the DOM; tests record the calls.
pub trait FormSurface {
    fn render_button(&self, button: &SubmitButton);
    fn render_status(&self, status: &StatusLine);
    fn render_field(&self, index: usize, field: &Field);

    /// Every field went back to its defaults after a successful send.
    fn render_reset(&self, fields: &[Field]) {
        for (index, field) in fields.iter().enumerate() {
            self.render_field(index, field);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    action: String,
    encoding: FormEncoding,
    fields: Vec<Field>,
    button: SubmitButton,
    status_line: StatusLine,
    status: SubmissionStatus,
    config: ContactConfig,
}

impl ContactForm {
    pub fn new(
        action: impl Into<String>,
        encoding: FormEncoding,
        fields: Vec<Field>,
        config: ContactConfig,
    ) -> Self {
        Self {
            action: action.into(),
            encoding,
            fields,
            button: SubmitButton {
                disabled: false,
                label: config.submit_label.clone(),
            },
            status_line: StatusLine::default(),
            status: SubmissionStatus::Idle,
            config,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.status_line
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Focus left field `index` holding `value`.
    pub fn blur(&mut self, index: usize, value: &str) -> Option<Result<(), ValidationError>> {
        let field = self.fields.get_mut(index)?;
        field.value = value.to_string();
        Some(field.on_blur())
    }

    /// Field `index` was edited; true when its invalid marker was cleared.
    pub fn input(&mut self, index: usize, value: &str) -> bool {
        self.fields
            .get_mut(index)
            .is_some_and(|field| field.on_input(value))
    }

    /// Takes the current values and switches into `Sending`: button disabled
    /// with the in-progress label, previous status hidden.
    ///
    /// With `block_on_invalid` every field is validated first and the
    /// failures are returned instead; nothing else changes in that case.
    pub fn begin_submission(&mut self) -> Result<OutgoingRequest, Vec<ValidationError>> {
        if self.config.block_on_invalid {
            let errors: Vec<ValidationError> = self
                .fields
                .iter_mut()
                .filter_map(|field| field.on_blur().err())
                .collect();
            if !errors.is_empty() {
                return Err(errors);
            }
        }

        let submission = FormSubmission {
            fields: self
                .fields
                .iter()
                .filter(|f| f.is_submitted())
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect(),
        };

        self.button.disabled = true;
        self.button.label = self.config.sending_label.clone();
        self.status_line = StatusLine::default();
        self.status = SubmissionStatus::Sending;

        Ok(OutgoingRequest {
            url: self.action.clone(),
            encoding: self.encoding,
            submission,
        })
    }

    pub fn finish_submission(&mut self, outcome: &Result<(), SubmitError>) {
        match outcome {
            Ok(()) => {
                self.status_line = StatusLine {
                    visible: true,
                    text: self.config.success_message.clone(),
                    class: STATUS_SUCCESS_CLASS.to_string(),
                };
                self.status = SubmissionStatus::Success;
                self.fields.iter_mut().for_each(Field::reset);
            }
            Err(_) => {
                self.status_line = StatusLine {
                    visible: true,
                    text: self.config.error_message.clone(),
                    class: STATUS_ERROR_CLASS.to_string(),
                };
                self.status = SubmissionStatus::Error;
            }
        }
    }

    /// Re-enables the submit button. An attempt that never settled falls
    /// back to `Idle`.
    pub fn release_button(&mut self) {
        self.button.disabled = false;
        self.button.label = self.config.submit_label.clone();
        if self.status == SubmissionStatus::Sending {
            self.status = SubmissionStatus::Idle;
        }
    }
}

/// Holds the form in `Sending`. Dropping it, on any path, re-enables the
/// submit button.
struct InFlight<'a, S: FormSurface + ?Sized> {
    form: &'a RefCell<ContactForm>,
    surface: &'a S,
}

impl<'a, S: FormSurface + ?Sized> InFlight<'a, S> {
    fn settle(self, outcome: Result<(), SubmitError>) -> SubmissionStatus {
        match &outcome {
            Ok(()) => info!("Contact form sent"),
            Err(e) => warn!("Contact form submission failed: {}", e),
        }

        let mut state = self.form.borrow_mut();
        state.finish_submission(&outcome);
        self.surface.render_status(state.status_line());
        if outcome.is_ok() {
            self.surface.render_reset(state.fields());
        }
        state.status()
    }
}

impl<S: FormSurface + ?Sized> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        match self.form.try_borrow_mut() {
            Ok(mut state) => {
                state.release_button();
                self.surface.render_button(state.button());
            }
            Err(_) => error!("Contact form busy, submit button left disabled"),
        }
    }
}

/// Runs one submission end to end.
///
/// The form is only borrowed between suspension points, so blur and input
/// events can still be handled while the request is pending.
pub async fn submit<T, S>(form: &RefCell<ContactForm>, transport: &T, surface: &S) -> SubmissionStatus
where
    T: Transport + ?Sized,
    S: FormSurface + ?Sized,
{
    let request = {
        let mut state = form.borrow_mut();
        let begun = state.begin_submission();
        match begun {
            Ok(request) => {
                surface.render_button(state.button());
                surface.render_status(state.status_line());
                request
            }
            Err(errors) => {
                warn!("Contact form not sent, {} invalid field(s)", errors.len());
                for e in &errors {
                    debug!("{}", e);
                }
                for (index, field) in state.fields().iter().enumerate() {
                    surface.render_field(index, field);
                }
                return state.status();
            }
        }
    };

    let in_flight = InFlight { form, surface };
    info!(
        "Posting {} field(s) to {}",
        request.submission.fields.len(),
        request.url
    );

    let outcome = match transport.send(&request).await {
        Ok(status) if (200..300).contains(&status) => Ok(()),
        Ok(status) => Err(SubmitError::ServerRejection { status }),
        Err(e) => Err(SubmitError::from(e)),
    };
    in_flight.settle(outcome)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use futures::FutureExt;

    use super::*;
    use crate::components::validation::FieldKind;
    use crate::error::TransportError;
    use crate::test_mocks::{contact_form, Event, MockTransport, RecordingSurface, Reply};

    const SUCCESS_TEXT: &str =
        "Thank you! Your message has been sent successfully. I'll get back to you soon.";
    const ERROR_TEXT: &str = "Oops! There was a problem sending your message. Please try again or contact me directly via email.";

    fn fill(form: &RefCell<ContactForm>) {
        let mut state = form.borrow_mut();
        state.input(0, "Ada");
        state.input(1, "ada@example.com");
        state.input(2, "Hello there");
    }

    fn values(form: &RefCell<ContactForm>) -> Vec<String> {
        form.borrow().fields().iter().map(|f| f.value.clone()).collect()
    }

    fn run(reply: Reply) -> (Rc<RefCell<ContactForm>>, Vec<Event>, SubmissionStatus) {
        let form = Rc::new(RefCell::new(contact_form(ContactConfig::default())));
        fill(&form);
        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), reply);
        let surface = RecordingSurface::new(log.clone());

        let status = block_on(submit(&form, &transport, &surface));
        let events = log.borrow().clone();
        (form, events, status)
    }

    fn position(events: &[Event], wanted: &Event) -> usize {
        events
            .iter()
            .position(|e| e == wanted)
            .unwrap_or_else(|| panic!("{:?} not in {:?}", wanted, events))
    }

    #[test]
    fn button_disabled_before_dispatch_and_released_after_for_every_outcome() {
        let replies = [
            Reply::Status(200),
            Reply::Status(500),
            Reply::Fail(TransportError::Network("offline".to_string())),
        ];

        for reply in replies {
            let (form, events, _) = run(reply.clone());

            let disabled = position(&events, &Event::Button { disabled: true, label: "Sending...".to_string() });
            let dispatched = position(&events, &Event::Dispatched);
            let released = position(&events, &Event::Button { disabled: false, label: "Send Message".to_string() });

            assert!(disabled < dispatched, "{:?}: {:?}", reply, events);
            assert!(dispatched < released, "{:?}: {:?}", reply, events);
            assert_eq!(events.last(), events.get(released));
            assert!(!form.borrow().button().disabled);
        }
    }

    #[test]
    fn prior_status_is_hidden_when_sending_starts() {
        let (_, events, _) = run(Reply::Status(200));
        let hidden = position(&events, &Event::Status(StatusLine::default()));
        assert!(hidden < position(&events, &Event::Dispatched));
    }

    #[test]
    fn success_clears_fields_and_shows_thank_you() {
        let (form, events, status) = run(Reply::Status(201));

        assert_eq!(status, SubmissionStatus::Success);
        assert_eq!(values(&form), vec!["", "", ""]);

        let state = form.borrow();
        assert_eq!(state.status_line().text, SUCCESS_TEXT);
        assert_eq!(state.status_line().class, "form-status success");
        assert!(state.status_line().visible);
        assert!(events.contains(&Event::Field { index: 2, value: String::new(), invalid: false }));
    }

    #[test]
    fn server_rejection_keeps_input() {
        let (form, events, status) = run(Reply::Status(422));

        assert_eq!(status, SubmissionStatus::Error);
        assert_eq!(values(&form), vec!["Ada", "ada@example.com", "Hello there"]);
        assert_eq!(form.borrow().status_line().text, ERROR_TEXT);
        assert_eq!(form.borrow().status_line().class, "form-status error");
        assert!(!events.iter().any(|e| matches!(e, Event::Field { .. })));
    }

    #[test]
    fn network_failure_keeps_input() {
        let (form, _, status) = run(Reply::Fail(TransportError::Network("offline".to_string())));

        assert_eq!(status, SubmissionStatus::Error);
        assert_eq!(values(&form), vec!["Ada", "ada@example.com", "Hello there"]);
        assert_eq!(form.borrow().status_line().text, ERROR_TEXT);
        assert_eq!(form.borrow().status_line().class, "form-status error");
    }

    #[test]
    fn request_carries_captured_values() {
        let (_, events, _) = run(Reply::Status(200));
        let sent = events.iter().find_map(|e| match e {
            Event::Sent(request) => Some(request.clone()),
            _ => None,
        });
        let request = sent.expect("request was sent");

        assert_eq!(request.url, "https://formspree.io/f/test");
        assert_eq!(request.encoding, FormEncoding::Multipart);
        assert_eq!(
            request.submission.fields,
            vec![
                ("name".to_string(), "Ada".to_string()),
                ("email".to_string(), "ada@example.com".to_string()),
                ("message".to_string(), "Hello there".to_string()),
            ]
        );
    }

    #[test]
    fn form_can_be_edited_while_request_is_pending() {
        let form = Rc::new(RefCell::new(contact_form(ContactConfig::default())));
        fill(&form);
        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), Reply::Status(500)).editing(form.clone(), 2, "Hello again");
        let surface = RecordingSurface::new(log);

        block_on(submit(&form, &transport, &surface));

        assert_eq!(form.borrow().field("message").unwrap().value, "Hello again");
    }

    #[test]
    fn dropping_a_pending_submission_still_releases_the_button() {
        let form = Rc::new(RefCell::new(contact_form(ContactConfig::default())));
        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), Reply::Hang);
        let surface = RecordingSurface::new(log);

        let pending = submit(&form, &transport, &surface).now_or_never();

        assert!(pending.is_none());
        let state = form.borrow();
        assert!(!state.button().disabled);
        assert_eq!(state.button().label, "Send Message");
        assert_eq!(state.status(), SubmissionStatus::Idle);
    }

    #[test]
    fn invalid_fields_do_not_block_by_default() {
        let form = Rc::new(RefCell::new(contact_form(ContactConfig::default())));
        form.borrow_mut().blur(1, "foo").unwrap().unwrap_err();
        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), Reply::Status(200));
        let surface = RecordingSurface::new(log.clone());

        let status = block_on(submit(&form, &transport, &surface));

        assert_eq!(status, SubmissionStatus::Success);
        assert!(log.borrow().contains(&Event::Dispatched));
    }

    #[test]
    fn block_on_invalid_skips_the_request() {
        let config = ContactConfig { block_on_invalid: true, ..ContactConfig::default() };
        let form = Rc::new(RefCell::new(contact_form(config)));
        form.borrow_mut().input(1, "foo");
        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), Reply::Status(200));
        let surface = RecordingSurface::new(log.clone());

        let status = block_on(submit(&form, &transport, &surface));

        assert_eq!(status, SubmissionStatus::Idle);
        let events = log.borrow();
        assert!(!events.contains(&Event::Dispatched));
        assert!(events.contains(&Event::Field { index: 0, value: String::new(), invalid: true }));
        assert!(events.contains(&Event::Field { index: 1, value: "foo".to_string(), invalid: true }));
        assert!(!form.borrow().button().disabled);
    }

    #[test]
    fn success_clears_invalid_markers_too() {
        let mut form = contact_form(ContactConfig::default());
        form.fields.push(Field::new("phone", FieldKind::Text, false));
        form.fields[3].invalid = true;

        form.begin_submission().unwrap();
        form.finish_submission(&Ok(()));

        assert!(form.fields().iter().all(|f| !f.invalid && f.value.is_empty()));
    }

    fn form_with_extras() -> ContactForm {
        let mut form = contact_form(ContactConfig::default());
        form.fields.extend([
            Field::new("_subject", FieldKind::Hidden, false).with_default("New contact"),
            Field::new("newsletter", FieldKind::Checkbox, false).with_default("on"),
            Field::new("referrer", FieldKind::Text, false)
                .with_default("legacy")
                .with_disabled(true),
        ]);
        form
    }

    fn sent_extras(request: &OutgoingRequest) -> Vec<(String, String)> {
        request
            .submission
            .fields
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "name" | "email" | "message"))
            .cloned()
            .collect()
    }

    #[test]
    fn body_skips_unchecked_and_disabled_controls() {
        let mut form = form_with_extras();

        let request = form.begin_submission().unwrap();

        assert_eq!(
            sent_extras(&request),
            vec![("_subject".to_string(), "New contact".to_string())]
        );
    }

    #[test]
    fn hidden_and_checkbox_values_survive_a_successful_send() {
        let mut form = form_with_extras();
        let newsletter = form.index_of("newsletter").unwrap();
        form.field_mut(newsletter).unwrap().checked = true;

        let first = form.begin_submission().unwrap();
        form.finish_submission(&Ok(()));
        form.release_button();
        let second = form.begin_submission().unwrap();

        assert_eq!(
            sent_extras(&first),
            vec![
                ("_subject".to_string(), "New contact".to_string()),
                ("newsletter".to_string(), "on".to_string()),
            ]
        );
        // Reset unchecks the box again but keeps the hidden subject.
        assert_eq!(
            sent_extras(&second),
            vec![("_subject".to_string(), "New contact".to_string())]
        );
        assert_eq!(form.field("newsletter").unwrap().value, "on");
    }

    #[test]
    fn walkthrough_from_typo_to_thank_you() {
        let form = Rc::new(RefCell::new(contact_form(ContactConfig::default())));
        let email = form.borrow().index_of("email").unwrap();

        assert!(form.borrow_mut().blur(email, "foo").unwrap().is_err());
        assert!(form.borrow().field("email").unwrap().invalid);

        form.borrow_mut().input(email, "foo@bar.com");
        assert!(form.borrow_mut().blur(email, "foo@bar.com").unwrap().is_ok());
        assert!(!form.borrow().field("email").unwrap().invalid);

        form.borrow_mut().input(0, "Ada");
        form.borrow_mut().input(2, "Hi!");

        let log = Rc::new(RefCell::new(Vec::new()));
        let transport = MockTransport::new(log.clone(), Reply::Status(200))
            .observing(form.clone());
        let surface = RecordingSurface::new(log.clone());
        let status = block_on(submit(&form, &transport, &surface));

        assert_eq!(
            transport.seen_button(),
            Some(SubmitButton { disabled: true, label: "Sending...".to_string() })
        );
        assert_eq!(status, SubmissionStatus::Success);
        let state = form.borrow();
        assert_eq!(state.status_line().text, SUCCESS_TEXT);
        assert_eq!(state.status_line().class, "form-status success");
        assert!(state.fields().iter().all(|f| f.value.is_empty()));
        assert_eq!(state.button(), &SubmitButton { disabled: false, label: "Send Message".to_string() });
    }
}
