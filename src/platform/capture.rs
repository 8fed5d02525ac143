//! [`captureStream()`][1] extension of [HTMLMediaElement][2], which
//! `web-sys` doesn't expose.
//!
//! [1]: https://w3.org/TR/mediacapture-fromelement/#dom-htmlmediaelement-capturestream
//! [2]: https://html.spec.whatwg.org/multipage/media.html#htmlmediaelement

use wasm_bindgen::prelude::*;
use web_sys::{HtmlVideoElement, MediaStream};

#[wasm_bindgen]
extern "C" {
    /// [HTMLVideoElement][1] with the [`captureStream()`][2] extension.
    ///
    /// [1]: https://html.spec.whatwg.org/multipage/media.html#htmlvideoelement
    /// [2]: https://w3.org/TR/mediacapture-fromelement
    #[wasm_bindgen(extends = HtmlVideoElement)]
    type CapturableVideoElement;

    #[wasm_bindgen(method, js_name = captureStream)]
    fn capture_stream_js(this: &CapturableVideoElement) -> MediaStream;
}

/// Returns a [MediaStream][1] of the element's current playback.
///
/// [1]: https://w3.org/TR/mediacapture-streams/#mediastream
pub fn capture_stream(video: &HtmlVideoElement) -> MediaStream {
    use wasm_bindgen::JsCast as _;

    video.unchecked_ref::<CapturableVideoElement>().capture_stream_js()
}
