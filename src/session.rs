//! Wiring of the demo page controls.

use std::{cell::RefCell, mem, rc::Rc};

use derive_more::Display;
use tracerr::Traced;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Event, HtmlCollection, HtmlElement};

use crate::{
    gallery::Gallery,
    platform::{
        self, EventListener, EventListenerBindError, MediaStreamTrack,
    },
};

/// Interval between automatic content hint flips, in milliseconds.
pub const AUTO_FLIP_INTERVAL_MS: i32 = 300;

/// Id of the element displaying the current content hint.
const HINT_LABEL_ID: &str = "contentHintLabel1";

/// CSS class marking a button whose toggled state is on.
const ACTIVE_CLASS: &str = "active";

/// Errors that may occur while wiring the demo page controls.
#[derive(Debug, Display)]
pub enum UiError {
    /// Demo page misses one of its fixed elements.
    #[display(fmt = "demo page misses element: {}", _0)]
    MissingElement(&'static str),

    /// Failed to bind a button click handler.
    #[display(fmt = "failed to bind click handler: {}", _0)]
    BindHandler(EventListenerBindError),

    /// Interval timer registration was rejected by the browser.
    #[display(fmt = "failed to start flip interval: {}", _0)]
    StartInterval(platform::Error),
}

impl From<EventListenerBindError> for UiError {
    fn from(err: EventListenerBindError) -> Self {
        Self::BindHandler(err)
    }
}

type Result<T> = std::result::Result<T, Traced<UiError>>;

/// Owner of a `setInterval` registration, clearing it on [`Drop`].
struct IntervalHandle {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        platform::window().clear_interval_with_handle(self.id);
    }
}

/// State of the automatic content hint flipping.
enum AutoFlip {
    /// No flipping is scheduled.
    Stopped,

    /// A flip fires on every interval tick until stopped.
    Running(IntervalHandle),
}

/// Context of one demo page: the outgoing track under control, the
/// gallery, and the state the button handlers mutate.
///
/// Holds what would otherwise be page-level globals as explicit fields;
/// every handler closes over an [`Rc`] of this context, keeping it alive
/// for the page lifetime.
pub struct DemoSession {
    /// Outgoing video track whose content hint the buttons flip.
    track: MediaStreamTrack,

    /// Element displaying the currently applied content hint.
    hint_label: HtmlElement,

    /// Gallery shared with the frame pipe.
    gallery: Gallery,

    /// Automatic flipping state.
    auto_flip: RefCell<AutoFlip>,

    /// Button toggling the automatic flipping, kept for kicking it off
    /// programmatically after setup.
    auto_button: Rc<HtmlElement>,

    /// Bound click handlers; dropping them would unbind the buttons.
    listeners: RefCell<Vec<EventListener<HtmlElement, Event>>>,
}

impl DemoSession {
    /// Creates a session over the outgoing `track` and wires the four
    /// demo buttons, taken in tag order from the page.
    ///
    /// # Errors
    ///
    /// Errors if one of the page's fixed elements is missing or a click
    /// handler cannot be bound.
    pub fn wire(track: MediaStreamTrack, gallery: Gallery) -> Result<Rc<Self>> {
        let document = platform::document();
        let hint_label = document
            .get_element_by_id(HINT_LABEL_ID)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| {
                tracerr::new!(UiError::MissingElement(HINT_LABEL_ID))
            })?;

        let buttons = document.get_elements_by_tag_name("button");
        let flip_button = button_at(&buttons, 0, "flip content hint")?;
        let auto_button = button_at(&buttons, 1, "automatic flip content hint")?;
        let gallery_button = button_at(&buttons, 2, "toggle gallery recording")?;
        let clear_button = button_at(&buttons, 3, "clear gallery recording")?;

        let session = Rc::new(Self {
            track,
            hint_label,
            gallery,
            auto_flip: RefCell::new(AutoFlip::Stopped),
            auto_button: Rc::clone(&auto_button),
            listeners: RefCell::new(Vec::new()),
        });

        set_active(&gallery_button, session.gallery.enabled());

        session.bind(&flip_button, |s, _| s.flip_content_hint())?;
        session.bind(&auto_button, |s, btn| s.toggle_auto_flip(btn))?;
        session.bind(&gallery_button, |s, btn| s.toggle_gallery(btn))?;
        session.bind(&clear_button, |s, _| s.clear_gallery())?;

        Ok(session)
    }

    /// Flips the outgoing track's content hint and reflects the newly
    /// applied value in the page label.
    pub fn flip_content_hint(&self) {
        let hint = self.track.flip_content_hint();
        self.hint_label.set_inner_text(&hint.to_string());
    }

    /// Starts the [`AUTO_FLIP_INTERVAL_MS`] flip interval, or cancels it
    /// if it's already running.
    pub fn toggle_auto_flip(self: &Rc<Self>, button: &HtmlElement) {
        let mut auto_flip = self.auto_flip.borrow_mut();
        *auto_flip = match mem::replace(&mut *auto_flip, AutoFlip::Stopped) {
            // The interval is cleared by the handle drop.
            AutoFlip::Running(_) => AutoFlip::Stopped,
            AutoFlip::Stopped => match self.start_flip_interval() {
                Ok(handle) => AutoFlip::Running(handle),
                Err(e) => {
                    log::error!("{}", e);
                    AutoFlip::Stopped
                }
            },
        };
        set_active(button, matches!(*auto_flip, AutoFlip::Running(_)));
    }

    /// Starts the automatic flipping, as the demo page does right after
    /// setup.
    pub fn begin_auto_flip(self: &Rc<Self>) {
        if !self.auto_flip_running() {
            let button = Rc::clone(&self.auto_button);
            self.toggle_auto_flip(&button);
        }
    }

    /// Indicates whether automatic flipping currently runs.
    #[must_use]
    pub fn auto_flip_running(&self) -> bool {
        matches!(*self.auto_flip.borrow(), AutoFlip::Running(_))
    }

    /// Flips the gallery-enabled flag.
    pub fn toggle_gallery(&self, button: &HtmlElement) {
        set_active(button, self.gallery.toggle());
    }

    /// Removes all captured thumbnails from the page.
    pub fn clear_gallery(&self) {
        self.gallery.clear();
    }

    /// Binds `handler` to clicks of the provided button, keeping the
    /// subscription alive within this session.
    fn bind<F>(
        self: &Rc<Self>,
        button: &Rc<HtmlElement>,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(&Rc<Self>, &HtmlElement) + 'static,
    {
        let session = Rc::clone(self);
        let btn = Rc::clone(button);
        let listener = EventListener::new_mut(
            Rc::clone(button),
            "click",
            move |_: Event| handler(&session, &btn),
        )
        .map_err(tracerr::map_from_and_wrap!(=> UiError))?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    /// Schedules [`DemoSession::flip_content_hint`] on every interval
    /// tick.
    fn start_flip_interval(self: &Rc<Self>) -> Result<IntervalHandle> {
        let session = Rc::clone(self);
        let closure = Closure::wrap(
            Box::new(move || session.flip_content_hint()) as Box<dyn FnMut()>,
        );
        let id = platform::window()
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                AUTO_FLIP_INTERVAL_MS,
            )
            .map_err(platform::Error::from)
            .map_err(UiError::StartInterval)
            .map_err(tracerr::wrap!())?;
        Ok(IntervalHandle {
            id,
            _closure: closure,
        })
    }
}

/// Returns the `index`th button of the page with its label set.
fn button_at(
    buttons: &HtmlCollection,
    index: u32,
    label: &str,
) -> Result<Rc<HtmlElement>> {
    let button = buttons
        .item(index)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| tracerr::new!(UiError::MissingElement("button")))?;
    button.set_inner_text(label);
    Ok(Rc::new(button))
}

/// Toggles the `active` CSS class of a button, mirroring a boolean state.
fn set_active(button: &HtmlElement, active: bool) {
    let _ = button.class_list().toggle_with_force(ACTIVE_CLASS, active);
}
