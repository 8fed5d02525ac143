#![cfg(target_arch = "wasm32")]

use std::time::Duration;

use content_hints_demo::{
    gallery::{observe_decoded_frames, Gallery},
    loopback::LoopbackPair,
    platform::{self, ContentHint, MediaStreamTrack},
    session::{DemoSession, AUTO_FLIP_INTERVAL_MS},
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

/// Creates a canvas-backed video [`MediaStreamTrack`] producing real
/// frames.
fn canvas_track() -> (HtmlCanvasElement, MediaStreamTrack) {
    let canvas: HtmlCanvasElement = platform::document()
        .create_element("canvas")
        .unwrap()
        .unchecked_into();
    canvas.set_width(64);
    canvas.set_height(48);
    redraw(&canvas, "#ff0000");

    let stream = canvas.capture_stream_with_frame_rate(10.0).unwrap();
    let track = MediaStreamTrack::from(stream.get_video_tracks().get(0));
    (canvas, track)
}

/// Repaints the whole canvas, marking it dirty for the capture stream.
fn redraw(canvas: &HtmlCanvasElement, color: &str) {
    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .unwrap()
        .unwrap()
        .unchecked_into();
    context.set_fill_style(&color.into());
    context.fill_rect(
        0.0,
        0.0,
        f64::from(canvas.width()),
        f64::from(canvas.height()),
    );
}

async fn sleep(ms: u64) {
    platform::delay_for(Duration::from_millis(ms)).await;
}

/// Demo page skeleton appended to the test page body, removed on drop.
struct TestDom {
    elements: Vec<HtmlElement>,
}

impl TestDom {
    fn new() -> Self {
        let document = platform::document();
        let body = document.body().unwrap();
        let mut elements = Vec::new();

        let label: HtmlElement =
            document.create_element("div").unwrap().unchecked_into();
        label.set_id("contentHintLabel1");
        body.append_child(&label).unwrap();
        elements.push(label);

        for _ in 0..4 {
            let button: HtmlElement =
                document.create_element("button").unwrap().unchecked_into();
            body.append_child(&button).unwrap();
            elements.push(button);
        }

        Self { elements }
    }

    fn label_text(&self) -> String {
        self.elements[0].inner_text()
    }
}

impl Drop for TestDom {
    fn drop(&mut self) {
        for element in &self.elements {
            element.remove();
        }
    }
}

#[wasm_bindgen_test]
fn content_hint_is_reflected_on_real_track() {
    let (_canvas, track) = canvas_track();

    assert_eq!(track.content_hint(), ContentHint::None);

    track.set_content_hint(ContentHint::Motion);
    assert_eq!(track.content_hint(), ContentHint::Motion);

    assert_eq!(track.flip_content_hint(), ContentHint::Detail);
    assert_eq!(track.flip_content_hint(), ContentHint::Motion);
    assert_eq!(track.content_hint(), ContentHint::Motion);

    track.stop();
}

#[wasm_bindgen_test]
async fn loopback_delivers_single_video_track() {
    let (_canvas, track) = canvas_track();
    let upstream = web_sys::MediaStream::new().unwrap();
    upstream.add_track(track.as_ref());

    let pair = LoopbackPair::new().unwrap();
    let downstream = pair.start(&upstream, Some(75)).await.unwrap();

    assert_eq!(downstream.get_video_tracks().length(), 1);

    let sender = pair.sender_track().unwrap();
    assert_eq!(sender.id(), track.id());

    track.stop();
}

#[wasm_bindgen_test]
async fn loopback_rejects_stream_without_video() {
    let upstream = web_sys::MediaStream::new().unwrap();

    let pair = LoopbackPair::new().unwrap();
    assert!(pair.start(&upstream, None).await.is_err());
}

#[wasm_bindgen_test]
async fn auto_flip_alternates_hint_until_stopped() {
    let dom = TestDom::new();
    let (_canvas, track) = canvas_track();
    let session =
        DemoSession::wire(track.clone(), Gallery::new(false)).unwrap();

    assert!(!session.auto_flip_running());
    session.begin_auto_flip();
    assert!(session.auto_flip_running());

    // From an unset hint the flips go detail, motion, detail, ...
    // Sample in the middle of the second tick's window.
    sleep(AUTO_FLIP_INTERVAL_MS as u64 * 2 + 150).await;
    assert_eq!(track.content_hint(), ContentHint::Motion);
    assert_eq!(dom.label_text(), "motion");

    session.toggle_auto_flip(&dom.elements[2]);
    assert!(!session.auto_flip_running());

    let stopped_at = track.content_hint();
    sleep(AUTO_FLIP_INTERVAL_MS as u64 * 2 + 100).await;
    assert_eq!(track.content_hint(), stopped_at);

    track.stop();
}

#[wasm_bindgen_test]
async fn enabled_gallery_collects_thumbnails() {
    let gallery = Gallery::new(true);
    gallery.clear();

    let (canvas, track) = canvas_track();
    let observed = observe_decoded_frames(&track, gallery.clone()).unwrap();

    for _ in 0..10 {
        redraw(&canvas, "#00ff00");
        sleep(100).await;
    }

    let thumbnails = platform::document()
        .get_elements_by_class_name("galleryPicture");
    assert!(thumbnails.length() > 0);

    gallery.clear();
    assert_eq!(
        platform::document()
            .get_elements_by_class_name("galleryPicture")
            .length(),
        0,
    );

    track.stop();
    observed.stop();
}

#[wasm_bindgen_test]
async fn disabled_gallery_collects_nothing() {
    let gallery = Gallery::new(false);
    gallery.clear();

    let (canvas, track) = canvas_track();
    let observed = observe_decoded_frames(&track, gallery.clone()).unwrap();

    for _ in 0..5 {
        redraw(&canvas, "#0000ff");
        sleep(100).await;
    }

    assert_eq!(
        platform::document()
            .get_elements_by_class_name("galleryPicture")
            .length(),
        0,
    );

    track.stop();
    observed.stop();
}
