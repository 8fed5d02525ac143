//! Interception of decoded video frames and the on-page thumbnail
//! gallery.

use std::{cell::Cell, rc::Rc};

use derive_more::Display;
use tracerr::Traced;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, MediaStreamTrackGenerator,
    MediaStreamTrackGeneratorInit, MediaStreamTrackProcessor,
    MediaStreamTrackProcessorInit, ReadableStreamDefaultReader, VideoFrame,
    WritableStreamDefaultWriter,
};

use crate::platform::{self, MediaStreamTrack};

/// CSS class of the thumbnail canvases appended to the page.
const THUMBNAIL_CLASS: &str = "galleryPicture";

/// Errors that may occur while building the frame pipe.
#[derive(Debug, Display)]
pub enum FrameObserverError {
    /// Occurs when a [MediaStreamTrackProcessor][1] cannot be created over
    /// the received track.
    ///
    /// [1]: https://w3.org/TR/mediacapture-transform/#track-processor
    #[display(fmt = "failed to create MediaStreamTrackProcessor: {}", _0)]
    CreateProcessor(platform::Error),

    /// Occurs when a video [MediaStreamTrackGenerator][1] cannot be
    /// created.
    ///
    /// [1]: https://w3.org/TR/mediacapture-transform/#track-generator
    #[display(fmt = "failed to create MediaStreamTrackGenerator: {}", _0)]
    CreateGenerator(platform::Error),

    /// Occurs when the reader or writer end of the frame pipe cannot be
    /// acquired.
    #[display(fmt = "failed to open frame pipe: {}", _0)]
    OpenPipe(platform::Error),
}

type Result<T> = std::result::Result<T, Traced<FrameObserverError>>;

/// Handle to the on-page snapshot gallery and its enabled flag.
///
/// Clones share the flag, so the UI handler and the frame pipe observe
/// the same state.
#[derive(Clone)]
pub struct Gallery {
    /// Whether arriving frames should be snapshotted onto the page.
    enabled: Rc<Cell<bool>>,
}

impl Gallery {
    /// Creates a new [`Gallery`] with the provided initial state of its
    /// enabled flag.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Rc::new(Cell::new(enabled)),
        }
    }

    /// Indicates whether arriving frames are snapshotted.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Flips the gallery-enabled flag, returning the new value.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.get();
        self.enabled.set(enabled);
        enabled
    }

    /// Removes every thumbnail previously appended to the page.
    pub fn clear(&self) {
        let thumbnails =
            platform::document().get_elements_by_class_name(THUMBNAIL_CLASS);
        // The collection is live, so removal shrinks it.
        while let Some(thumbnail) = thumbnails.item(0) {
            thumbnail.remove();
        }
    }

    /// Renders `frame` onto a fresh canvas appended to the page body.
    ///
    /// Snapshot failures are logged and otherwise ignored: a lost
    /// thumbnail must not stall the frame pipe.
    fn snap(&self, frame: &VideoFrame) {
        if let Err(e) = self.try_snap(frame) {
            log::error!(
                "failed to snapshot frame: {}",
                platform::Error::from(e),
            );
        }
    }

    fn try_snap(&self, frame: &VideoFrame) -> std::result::Result<(), JsValue> {
        let document = platform::document();
        let canvas: HtmlCanvasElement =
            document.create_element("canvas")?.unchecked_into();
        canvas.set_class_name(THUMBNAIL_CLASS);
        canvas.set_width(frame.display_width());
        canvas.set_height(frame.display_height());

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d canvas context"))?
            .unchecked_into();
        context.draw_image_with_video_frame(frame, 0.0, 0.0)?;

        document
            .body()
            .ok_or_else(|| JsValue::from_str("page has no body"))?
            .append_child(&canvas)?;
        Ok(())
    }
}

/// Taps every decoded frame of the provided `track`, snapshotting it into
/// `gallery` when the gallery is enabled, and forwards it unmodified into
/// the returned track.
///
/// The returned track is backed by a [MediaStreamTrackGenerator][1] fed by
/// a spawned read/write loop; the loop ends when the source track ends.
///
/// # Errors
///
/// Errors if the processor, generator, or either end of the pipe between
/// them cannot be created.
///
/// [1]: https://w3.org/TR/mediacapture-transform/#track-generator
pub fn observe_decoded_frames(
    track: &MediaStreamTrack,
    gallery: Gallery,
) -> Result<MediaStreamTrack> {
    let processor = MediaStreamTrackProcessor::new(
        &MediaStreamTrackProcessorInit::new(track.as_ref()),
    )
    .map_err(Into::into)
    .map_err(FrameObserverError::CreateProcessor)
    .map_err(tracerr::wrap!())?;

    let generator = MediaStreamTrackGenerator::new(
        &MediaStreamTrackGeneratorInit::new("video"),
    )
    .map_err(Into::into)
    .map_err(FrameObserverError::CreateGenerator)
    .map_err(tracerr::wrap!())?;

    let reader = ReadableStreamDefaultReader::new(&processor.readable())
        .map_err(Into::into)
        .map_err(FrameObserverError::OpenPipe)
        .map_err(tracerr::wrap!())?;
    let writer = generator
        .writable()
        .get_writer()
        .map_err(Into::into)
        .map_err(FrameObserverError::OpenPipe)
        .map_err(tracerr::wrap!())?;

    let downstream = MediaStreamTrack::from(generator);
    platform::spawn(async move {
        if let Err(e) = pump_frames(&reader, &writer, &gallery).await {
            log::error!("frame pipe stopped: {}", platform::Error::from(e));
        }
    });

    Ok(downstream)
}

/// Read/snapshot/write loop over the frame pipe.
///
/// Every frame read from the processor is handed over to the generator,
/// which consumes it; nothing is dropped and no backpressure is applied
/// beyond what the underlying streams do themselves.
async fn pump_frames(
    reader: &ReadableStreamDefaultReader,
    writer: &WritableStreamDefaultWriter,
    gallery: &Gallery,
) -> std::result::Result<(), JsValue> {
    loop {
        let read = JsFuture::from(reader.read()).await?;

        let done = js_sys::Reflect::get(&read, &JsValue::from_str("done"))?;
        if done.is_truthy() {
            break;
        }

        let frame: VideoFrame =
            js_sys::Reflect::get(&read, &JsValue::from_str("value"))?
                .unchecked_into();
        if gallery.enabled() {
            gallery.snap(&frame);
        }
        JsFuture::from(writer.write_with_chunk(frame.as_ref())).await?;
    }
    Ok(())
}
