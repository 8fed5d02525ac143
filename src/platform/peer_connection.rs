//! Wrapper around [RTCPeerConnection][1].
//!
//! [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface

use std::{cell::RefCell, rc::Rc};

use derive_more::Display;
use tracerr::Traced;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    MediaStream, RtcIceCandidateInit,
    RtcPeerConnection as SysRtcPeerConnection, RtcPeerConnectionIceEvent,
    RtcRtpSender, RtcSdpType, RtcSessionDescription, RtcSessionDescriptionInit,
    RtcTrackEvent,
};

use crate::platform::{
    self, media_track::MediaStreamTrack, EventListener, EventListenerBindError,
};

/// [RTCIceCandidate][1] representation.
///
/// [1]: https://w3.org/TR/webrtc/#rtcicecandidate-interface
pub struct IceCandidate {
    /// [`candidate` field][2] of the discovered [RTCIceCandidate][1].
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcicecandidate
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcicecandidate-candidate
    pub candidate: String,

    /// [`sdpMLineIndex` field][2] of the discovered [RTCIceCandidate][1].
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcicecandidate
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcicecandidate-sdpmlineindex
    pub sdp_m_line_index: Option<u16>,

    /// [`sdpMid` field][2] of the discovered [RTCIceCandidate][1].
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcicecandidate
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcicecandidate-sdpmid
    pub sdp_mid: Option<String>,
}

/// Representation of [RTCSdpType].
///
/// [RTCSdpType]: https://w3.org/TR/webrtc/#dom-rtcsdptype
pub enum SdpType {
    /// [`offer` type][1] of SDP.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcsdptype-offer
    Offer(String),

    /// [`answer` type][1] of SDP.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcsdptype-answer
    Answer(String),
}

/// Errors that may occur during signaling between two
/// [RTCPeerConnection][1]s and event handlers setting errors.
///
/// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
#[derive(Debug, Display)]
pub enum PeerConnectionError {
    /// Occurs when a remote candidate cannot be added to the
    /// [`RtcPeerConnection`].
    #[display(fmt = "failed to add ICE candidate: {}", _0)]
    AddIceCandidate(platform::Error),

    /// Occurs when an SDP answer cannot be obtained from the underlying
    /// [RTCPeerConnection][`SysRtcPeerConnection`].
    #[display(fmt = "failed to create SDP answer: {}", _0)]
    CreateAnswer(platform::Error),

    /// Occurs when a new [`RtcPeerConnection`] cannot be created.
    #[display(fmt = "failed to create PeerConnection: {}", _0)]
    CreatePeer(platform::Error),

    /// Occurs when an SDP offer cannot be obtained from the underlying
    /// [RTCPeerConnection][`SysRtcPeerConnection`].
    #[display(fmt = "failed to create SDP offer: {}", _0)]
    CreateOffer(platform::Error),

    /// Occurs when a handler cannot be bound to one of the
    /// [`RtcPeerConnection`]'s events.
    #[display(fmt = "failed to bind peer connection handler: {}", _0)]
    BindEventHandler(EventListenerBindError),

    /// Occurs if the local description associated with the
    /// [`RtcPeerConnection`] cannot be changed.
    #[display(fmt = "failed to set local SDP description: {}", _0)]
    SetLocalDescription(platform::Error),

    /// Occurs if the description of the remote end of the
    /// [`RtcPeerConnection`] cannot be changed.
    #[display(fmt = "failed to set remote SDP description: {}", _0)]
    SetRemoteDescription(platform::Error),
}

impl From<EventListenerBindError> for PeerConnectionError {
    fn from(err: EventListenerBindError) -> Self {
        Self::BindEventHandler(err)
    }
}

type Result<T> = std::result::Result<T, Traced<PeerConnectionError>>;

/// Representation of [RTCPeerConnection][1].
///
/// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
pub struct RtcPeerConnection {
    /// Underlying [RTCPeerConnection][1].
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
    peer: Rc<SysRtcPeerConnection>,

    /// [`onicecandidate`][2] callback of [RTCPeerConnection][1]. It fires
    /// when [RTCPeerConnection][1] discovers a new [RTCIceCandidate][3].
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-onicecandidate
    /// [3]: https://w3.org/TR/webrtc/#dom-rtcicecandidate
    on_ice_candidate: RefCell<
        Option<EventListener<SysRtcPeerConnection, RtcPeerConnectionIceEvent>>,
    >,

    /// [`ontrack`][2] callback of [RTCPeerConnection][1]. It fires when
    /// [RTCPeerConnection][1] receives a new [MediaStreamTrack][3] from a
    /// remote peer.
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-ontrack
    /// [3]: https://w3.org/TR/mediacapture-streams/#mediastreamtrack
    on_track:
        RefCell<Option<EventListener<SysRtcPeerConnection, RtcTrackEvent>>>,
}

impl RtcPeerConnection {
    /// Instantiates new [`RtcPeerConnection`] with the default
    /// configuration (no ICE servers are needed for an in-page loopback).
    ///
    /// # Errors
    ///
    /// Errors with [`PeerConnectionError::CreatePeer`] if the underlying
    /// [RTCPeerConnection][1] cannot be constructed.
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
    pub fn new() -> Result<Self> {
        let peer = SysRtcPeerConnection::new()
            .map_err(Into::into)
            .map_err(PeerConnectionError::CreatePeer)
            .map_err(tracerr::wrap!())?;

        Ok(Self {
            peer: Rc::new(peer),
            on_ice_candidate: RefCell::new(None),
            on_track: RefCell::new(None),
        })
    }

    /// Sets handler for the [`RtcTrackEvent`] (see [RTCTrackEvent][1] and
    /// [`ontrack` callback][2]).
    ///
    /// # Errors
    ///
    /// Errors if the handler binding fails.
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtctrackevent
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-ontrack
    pub fn on_track<F>(&self, f: Option<F>) -> Result<()>
    where
        F: 'static + FnMut(RtcTrackEvent),
    {
        let mut on_track = self.on_track.borrow_mut();
        match f {
            None => {
                on_track.take();
            }
            Some(mut f) => {
                on_track.replace(
                    EventListener::new_mut(
                        Rc::clone(&self.peer),
                        "track",
                        move |msg: RtcTrackEvent| {
                            f(msg);
                        },
                    )
                    .map_err(tracerr::map_from_and_wrap!(
                        => PeerConnectionError
                    ))?,
                );
            }
        }
        Ok(())
    }

    /// Sets handler for the [`RtcPeerConnectionIceEvent`] (see
    /// [RTCPeerConnectionIceEvent][1] and [`onicecandidate` callback][2]).
    ///
    /// # Errors
    ///
    /// Errors if the handler binding fails.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcpeerconnectioniceevent
    /// [2]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-onicecandidate
    pub fn on_ice_candidate<F>(&self, f: Option<F>) -> Result<()>
    where
        F: 'static + FnMut(IceCandidate),
    {
        let mut on_ice_candidate = self.on_ice_candidate.borrow_mut();
        match f {
            None => {
                on_ice_candidate.take();
            }
            Some(mut f) => {
                on_ice_candidate.replace(
                    EventListener::new_mut(
                        Rc::clone(&self.peer),
                        "icecandidate",
                        move |msg: RtcPeerConnectionIceEvent| {
                            // None candidate means that all ICE transports
                            // have finished gathering candidates. Doesn't
                            // need to be delivered onward to the remote
                            // peer.
                            if let Some(c) = msg.candidate() {
                                f(IceCandidate {
                                    candidate: c.candidate(),
                                    sdp_m_line_index: c.sdp_m_line_index(),
                                    sdp_mid: c.sdp_mid(),
                                });
                            }
                        },
                    )
                    .map_err(tracerr::map_from_and_wrap!(
                        => PeerConnectionError
                    ))?,
                );
            }
        }
        Ok(())
    }

    /// Adds remote [RTCPeerConnection][1]'s [ICE candidate][2] to this
    /// [`RtcPeerConnection`].
    ///
    /// # Errors
    ///
    /// Errors with [`PeerConnectionError::AddIceCandidate`] if the
    /// underlying [addIceCandidate][3] call rejects.
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcpeerconnection-interface
    /// [2]: https://tools.ietf.org/html/rfc5245#section-2
    /// [3]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-addicecandidate
    pub async fn add_ice_candidate(
        &self,
        candidate: &str,
        sdp_m_line_index: Option<u16>,
        sdp_mid: &Option<String>,
    ) -> Result<()> {
        let mut cand_init = RtcIceCandidateInit::new(candidate);
        cand_init
            .sdp_m_line_index(sdp_m_line_index)
            .sdp_mid(sdp_mid.as_deref());
        JsFuture::from(
            self.peer.add_ice_candidate_with_opt_rtc_ice_candidate_init(
                Some(cand_init).as_ref(),
            ),
        )
        .await
        .map_err(Into::into)
        .map_err(PeerConnectionError::AddIceCandidate)
        .map_err(tracerr::wrap!())?;
        Ok(())
    }

    /// Obtains an [SDP offer][`SdpType::Offer`] from the underlying
    /// [RTCPeerConnection][`SysRtcPeerConnection`] and sets it as the local
    /// description, returning the offer text.
    ///
    /// # Errors
    ///
    /// Errors if offer creation or local description setting rejects.
    pub async fn create_and_set_offer(&self) -> Result<String> {
        let create_offer = JsFuture::from(self.peer.create_offer())
            .await
            .map_err(Into::into)
            .map_err(PeerConnectionError::CreateOffer)
            .map_err(tracerr::wrap!())?;
        let offer = RtcSessionDescription::from(create_offer).sdp();

        let mut desc = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
        desc.sdp(&offer);

        JsFuture::from(self.peer.set_local_description(&desc))
            .await
            .map_err(Into::into)
            .map_err(PeerConnectionError::SetLocalDescription)
            .map_err(tracerr::wrap!())?;

        Ok(offer)
    }

    /// Obtains an [SDP answer][`SdpType::Answer`] from the underlying
    /// [RTCPeerConnection][`SysRtcPeerConnection`] without applying it,
    /// so the caller may rewrite the text before
    /// [`RtcPeerConnection::set_local_answer`].
    ///
    /// Should be called whenever remote description has been changed.
    ///
    /// # Errors
    ///
    /// Errors with [`PeerConnectionError::CreateAnswer`] if the underlying
    /// [createAnswer][1] call rejects.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-createanswer
    pub async fn create_answer(&self) -> Result<String> {
        let answer = JsFuture::from(self.peer.create_answer())
            .await
            .map_err(Into::into)
            .map_err(PeerConnectionError::CreateAnswer)
            .map_err(tracerr::wrap!())?;

        Ok(RtcSessionDescription::from(answer).sdp())
    }

    /// Applies the provided SDP text as the local
    /// [answer][`SdpType::Answer`] description.
    ///
    /// # Errors
    ///
    /// Errors with [`PeerConnectionError::SetLocalDescription`] if the
    /// underlying [setLocalDescription][1] call rejects.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-peerconnection-setlocaldescription
    pub async fn set_local_answer(&self, answer: &str) -> Result<()> {
        let mut desc = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
        desc.sdp(answer);

        JsFuture::from(self.peer.set_local_description(&desc))
            .await
            .map_err(Into::into)
            .map_err(PeerConnectionError::SetLocalDescription)
            .map_err(tracerr::wrap!())?;

        Ok(())
    }

    /// Instructs the underlying [RTCPeerConnection][`SysRtcPeerConnection`]
    /// to apply the supplied [SDP][`SdpType`] as the remote
    /// [offer][`SdpType::Offer`] or [answer][`SdpType::Answer`].
    ///
    /// # Errors
    ///
    /// Errors with [`PeerConnectionError::SetRemoteDescription`] if the
    /// underlying [setRemoteDescription][1] call rejects.
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-peerconnection-setremotedescription
    pub async fn set_remote_description(&self, sdp: SdpType) -> Result<()> {
        let description = match sdp {
            SdpType::Offer(offer) => {
                let mut desc =
                    RtcSessionDescriptionInit::new(RtcSdpType::Offer);
                desc.sdp(&offer);
                desc
            }
            SdpType::Answer(answer) => {
                let mut desc =
                    RtcSessionDescriptionInit::new(RtcSdpType::Answer);
                desc.sdp(&answer);
                desc
            }
        };

        JsFuture::from(self.peer.set_remote_description(&description))
            .await
            .map_err(Into::into)
            .map_err(PeerConnectionError::SetRemoteDescription)
            .map_err(tracerr::wrap!())?;

        Ok(())
    }

    /// Adds the provided track to this [`RtcPeerConnection`]'s set of
    /// senders, associating it with `stream` so the remote side's track
    /// event carries the stream.
    pub fn add_track(&self, track: &MediaStreamTrack, stream: &MediaStream) {
        let _ = self.peer.add_track(
            track.as_ref(),
            stream,
            &js_sys::Array::new(),
        );
    }

    /// Returns the track of the first [RTCRtpSender][1] of this
    /// [`RtcPeerConnection`], if any.
    ///
    /// [1]: https://w3.org/TR/webrtc/#rtcrtpsender-interface
    pub fn first_sender_track(&self) -> Option<MediaStreamTrack> {
        let senders = self.peer.get_senders();
        if senders.length() == 0 {
            return None;
        }
        RtcRtpSender::from(senders.get(0))
            .track()
            .map(MediaStreamTrack::from)
    }
}

impl Drop for RtcPeerConnection {
    /// Drops [`on_track`][`RtcPeerConnection::on_track`] and
    /// [`on_ice_candidate`][`RtcPeerConnection::on_ice_candidate`]
    /// callbacks, and [closes][1] the underlying
    /// [RTCPeerConnection][`SysRtcPeerConnection`].
    ///
    /// [1]: https://w3.org/TR/webrtc/#dom-rtcpeerconnection-close
    fn drop(&mut self) {
        self.on_track.borrow_mut().take();
        self.on_ice_candidate.borrow_mut().take();
        self.peer.close();
    }
}
