//! In-page WebRTC demo flipping the [content hint][1] of an outgoing
//! video track while its stream travels through a bandwidth-capped
//! loopback connection, making the encoder's degradation tradeoff
//! visible on the receiving side.
//!
//! [1]: https://w3.org/TR/mst-content-hint

pub mod gallery;
pub mod loopback;
pub mod platform;
pub mod sdp;
pub mod session;

use std::rc::Rc;

use derive_more::{Display, From};
use futures::channel::oneshot;
use tracerr::Traced;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{HtmlVideoElement, MediaStream};

use crate::{
    gallery::{FrameObserverError, Gallery},
    loopback::{LoopbackError, LoopbackPair},
    platform::{EventListener, EventListenerBindError, MediaStreamTrack},
    session::{DemoSession, UiError},
};

/// Bandwidth cap applied to the loopback SDP answer, in kbps.
///
/// Low enough to force visible encoder degradation on a camera-sized
/// video.
pub const BITRATE_KBPS: u32 = 75;

/// Whether the thumbnail gallery records decoded frames from the start.
pub const USE_GALLERY: bool = true;

/// Id of the source `<video>` element whose playback is captured.
const SRC_VIDEO_ID: &str = "srcVideo1";

/// Id of the `<video>` element displaying the received stream.
const OUTPUT_VIDEO_ID: &str = "outputVideo";

/// Name of the elements displaying the applied bandwidth cap.
const BITRATE_LABEL_NAME: &str = "bitrateLabel";

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Errors that may fail the demo page setup.
#[derive(Debug, Display, From)]
pub enum DemoError {
    /// Demo page misses one of its fixed elements.
    #[display(fmt = "demo page misses element: {}", _0)]
    #[from(ignore)]
    MissingElement(&'static str),

    /// Sending endpoint reported no outgoing track after negotiation.
    #[display(fmt = "sending peer has no outgoing track")]
    NoSenderTrack,

    /// Failed to subscribe to the source video playback.
    #[display(fmt = "failed to await source playback: {}", _0)]
    AwaitPlayback(EventListenerBindError),

    /// Source video element refused to provide a capture stream.
    #[display(fmt = "failed to capture source video: {}", _0)]
    CreateStream(platform::Error),

    /// Loopback transport could not be established.
    Loopback(LoopbackError),

    /// Frame observation pipe could not be built.
    Frames(FrameObserverError),

    /// Page controls could not be wired.
    Ui(UiError),
}

type Result<T> = std::result::Result<T, Traced<DemoError>>;

/// Entry point of the demo, invoked once the wasm module is loaded.
#[wasm_bindgen(start)]
pub fn main_js() {
    platform::init_logger();
    platform::set_panic_hook();

    platform::spawn(async {
        if let Err(e) = run().await {
            log::error!("demo setup failed: {}", e);
        }
    });
}

/// Builds the whole demo: captures the source video, transports it over a
/// bandwidth-capped loopback pair, taps decoded frames for the gallery,
/// and wires the page controls.
async fn run() -> Result<()> {
    let src_video = video_element_by_id(SRC_VIDEO_ID)?;
    let output_video = video_element_by_id(OUTPUT_VIDEO_ID)?;
    write_bitrate_labels(BITRATE_KBPS);

    wait_for_playback(&src_video).await?;
    let upstream = platform::capture_stream(&src_video);

    let pair = LoopbackPair::new()
        .map_err(tracerr::map_from_and_wrap!(=> DemoError))?;
    let downstream = pair
        .start(&upstream, Some(BITRATE_KBPS))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> DemoError))?;

    let gallery = Gallery::new(USE_GALLERY);
    let received = MediaStreamTrack::from(downstream.get_video_tracks().get(0));
    let observed = gallery::observe_decoded_frames(&received, gallery.clone())
        .map_err(tracerr::map_from_and_wrap!(=> DemoError))?;

    let tracks = js_sys::Array::new();
    let sys_track: &web_sys::MediaStreamTrack = observed.as_ref();
    tracks.push(sys_track);
    let out_stream = MediaStream::new_with_tracks(&JsValue::from(tracks))
        .map_err(platform::Error::from)
        .map_err(DemoError::CreateStream)
        .map_err(tracerr::wrap!())?;
    output_video.set_src_object(Some(&out_stream));

    let sender_track = pair
        .sender_track()
        .ok_or_else(|| tracerr::new!(DemoError::NoSenderTrack))?;
    let session = DemoSession::wire(sender_track, gallery)
        .map_err(tracerr::map_from_and_wrap!(=> DemoError))?;
    session.begin_auto_flip();

    // Both live for the rest of the page lifetime.
    std::mem::forget((session, pair));
    Ok(())
}

/// Looks up a `<video>` element of the page by its id.
fn video_element_by_id(id: &'static str) -> Result<HtmlVideoElement> {
    platform::document()
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok())
        .ok_or_else(|| tracerr::new!(DemoError::MissingElement(id)))
}

/// Writes the applied bandwidth cap into every bitrate label of the page.
fn write_bitrate_labels(kbps: u32) {
    let labels = platform::document().get_elements_by_name(BITRATE_LABEL_NAME);
    for i in 0..labels.length() {
        if let Some(label) =
            labels.get(i).and_then(|n| n.dyn_into::<web_sys::HtmlElement>().ok())
        {
            label.set_inner_text(&kbps.to_string());
        }
    }
}

/// Resolves once the provided `<video>` element is playing.
///
/// Returns immediately if playback has already started.
async fn wait_for_playback(video: &HtmlVideoElement) -> Result<()> {
    if !video.paused() {
        return Ok(());
    }

    let (tx, rx) = oneshot::channel();
    let video = Rc::new(video.clone());
    let listener = EventListener::new_once(
        Rc::clone(&video),
        "play",
        move |_: web_sys::Event| {
            let _ = tx.send(());
        },
    )
    .map_err(tracerr::map_from_and_wrap!(=> DemoError))?;

    // Playback may have started between the check and the subscription.
    if video.paused() {
        let _ = rx.await;
    }
    drop(listener);
    Ok(())
}
