//! Wrapper around [MediaStreamTrack][1].
//!
//! [1]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack

use derive_more::{AsRef, Display};
use wasm_bindgen::JsValue;

use crate::platform::get_property_by_name;

/// Value of the [`contentHint`][1] attribute of a video
/// [MediaStreamTrack][2].
///
/// Suggests whether encoders should optimize the track for motion or for
/// detail.
///
/// [1]: https://w3.org/TR/mst-content-hint/#dom-mediastreamtrack-contenthint
/// [2]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ContentHint {
    /// No hint has been provided for the track.
    #[display(fmt = "")]
    None,

    /// Track contains video where motion is important.
    #[display(fmt = "motion")]
    Motion,

    /// Track contains video where detail is important.
    #[display(fmt = "detail")]
    Detail,
}

impl ContentHint {
    /// Returns the hint this one flips to: `detail` flips to `motion`,
    /// anything else flips to `detail`.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Detail => Self::Motion,
            Self::Motion | Self::None => Self::Detail,
        }
    }

    /// Parses a [`ContentHint`] out of the attribute's string value.
    ///
    /// Unknown and empty values map to [`ContentHint::None`].
    fn from_attr(value: &str) -> Self {
        match value {
            "motion" => Self::Motion,
            "detail" => Self::Detail,
            _ => Self::None,
        }
    }
}

/// Wrapper around [MediaStreamTrack][1].
///
/// [1]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
#[derive(AsRef, Clone, Debug)]
pub struct MediaStreamTrack {
    #[as_ref]
    sys_track: web_sys::MediaStreamTrack,
}

impl<T> From<T> for MediaStreamTrack
where
    web_sys::MediaStreamTrack: From<T>,
{
    fn from(from: T) -> MediaStreamTrack {
        MediaStreamTrack {
            sys_track: web_sys::MediaStreamTrack::from(from),
        }
    }
}

impl MediaStreamTrack {
    /// Returns [`id`][1] of the underlying [MediaStreamTrack][2].
    ///
    /// [1]: https://w3.org/TR/mediacapture-streams/#dom-mediastreamtrack-id
    /// [2]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
    pub fn id(&self) -> String {
        self.sys_track.id()
    }

    /// Returns [`contentHint`][1] of the underlying [MediaStreamTrack][2].
    ///
    /// Read via reflection, since `web-sys` doesn't expose this attribute.
    ///
    /// [1]: https://w3.org/TR/mst-content-hint/#dom-mediastreamtrack-contenthint
    /// [2]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
    pub fn content_hint(&self) -> ContentHint {
        get_property_by_name(&self.sys_track, "contentHint", |v| v.as_string())
            .map_or(ContentHint::None, |v| ContentHint::from_attr(&v))
    }

    /// Changes [`contentHint`][1] of the underlying [MediaStreamTrack][2].
    ///
    /// [1]: https://w3.org/TR/mst-content-hint/#dom-mediastreamtrack-contenthint
    /// [2]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
    pub fn set_content_hint(&self, hint: ContentHint) {
        let _ = js_sys::Reflect::set(
            self.sys_track.as_ref(),
            &JsValue::from_str("contentHint"),
            &JsValue::from_str(&hint.to_string()),
        );
    }

    /// Flips the track's content hint between `detail` and `motion`,
    /// returning the newly applied value.
    pub fn flip_content_hint(&self) -> ContentHint {
        let flipped = self.content_hint().flipped();
        self.set_content_hint(flipped);
        flipped
    }

    /// Changes [`readyState`][1] of the underlying [MediaStreamTrack][2] to
    /// [`ended`][3].
    ///
    /// [1]: https://tinyurl.com/w3-streams#dom-mediastreamtrack-readystate
    /// [2]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
    /// [3]: https://tinyurl.com/w3-streams#idl-def-MediaStreamTrackState.ended
    pub fn stop(&self) {
        self.sys_track.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::ContentHint;

    #[test]
    fn detail_and_motion_flip_into_each_other() {
        assert_eq!(ContentHint::Detail.flipped(), ContentHint::Motion);
        assert_eq!(ContentHint::Motion.flipped(), ContentHint::Detail);
    }

    #[test]
    fn unset_hint_flips_to_detail() {
        assert_eq!(ContentHint::None.flipped(), ContentHint::Detail);
    }

    #[test]
    fn double_flip_restores_original_hint() {
        for hint in &[ContentHint::Motion, ContentHint::Detail] {
            assert_eq!(hint.flipped().flipped(), *hint);
        }
    }

    #[test]
    fn attr_value_round_trips() {
        for hint in &[ContentHint::Motion, ContentHint::Detail] {
            assert_eq!(ContentHint::from_attr(&hint.to_string()), *hint);
        }
        assert_eq!(ContentHint::from_attr(""), ContentHint::None);
        assert_eq!(ContentHint::from_attr("text"), ContentHint::None);
    }
}
