//! Bindings and helpers over the browser platform APIs.

mod capture;
mod error;
mod event_listener;
mod media_track;
mod peer_connection;

use std::time::Duration;

use futures::Future;
use js_sys::Promise;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

#[doc(inline)]
pub use self::{
    capture::capture_stream,
    error::Error,
    event_listener::{EventListener, EventListenerBindError},
    media_track::{ContentHint, MediaStreamTrack},
    peer_connection::{
        IceCandidate, PeerConnectionError, RtcPeerConnection, SdpType,
    },
};

/// Returns the [`web_sys::Window`] object.
///
/// # Panics
///
/// When the window object is unavailable, which never happens in a
/// browser.
pub fn window() -> web_sys::Window {
    // Cannot be cached since Window is !Sync.
    web_sys::window().unwrap()
}

/// Returns the [`web_sys::Document`] of the current page.
///
/// # Panics
///
/// When the window holds no document, which never happens in a browser.
pub fn document() -> web_sys::Document {
    window().document().unwrap()
}

/// Runs a Rust [`Future`] on the current thread.
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

/// [`Future`] which resolves after the provided [`Duration`].
pub async fn delay_for(delay: Duration) {
    let delay_ms = delay.as_millis() as i32;
    let promise = Promise::new(&mut |resolve, _| {
        window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                &resolve, delay_ms,
            )
            .unwrap();
    });
    let _ = JsFuture::from(promise).await;
}

/// Initializes [`wasm_logger`] as the application logger, writing to the
/// browser console.
///
/// [`wasm_logger`]: https://docs.rs/wasm-logger
pub fn init_logger() {
    wasm_logger::init(wasm_logger::Config::default());
}

/// Sets a panic hook printing panics to the browser console.
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Returns property of a JS object by name if it's defined.
/// Converts the value with a given predicate.
pub fn get_property_by_name<T, F, U>(value: &T, name: &str, into: F) -> Option<U>
where
    T: AsRef<JsValue>,
    F: Fn(JsValue) -> Option<U>,
{
    js_sys::Reflect::get(value.as_ref(), &JsValue::from_str(name))
        .ok()
        .and_then(into)
}
