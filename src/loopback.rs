//! Pair of directly cross-wired peer connections transporting a single
//! video track.

use std::rc::Rc;

use derive_more::Display;
use futures::channel::oneshot;
use tracerr::Traced;
use web_sys::MediaStream;

use crate::{
    platform::{
        self, MediaStreamTrack, PeerConnectionError, RtcPeerConnection,
        SdpType,
    },
    sdp,
};

/// Errors that may occur while the loopback pair negotiates.
#[derive(Debug, Display)]
pub enum LoopbackError {
    /// Failure of one of the underlying peer connection operations.
    #[display(fmt = "{}", _0)]
    Peer(PeerConnectionError),

    /// Upstream media stream holds no video track to transport.
    #[display(fmt = "upstream stream has no video track")]
    NoVideoTrack,

    /// Receiving endpoint was dropped before its track event fired.
    #[display(fmt = "receiving peer dropped before track arrived")]
    Dropped,
}

impl From<PeerConnectionError> for LoopbackError {
    fn from(err: PeerConnectionError) -> Self {
        Self::Peer(err)
    }
}

type Result<T> = std::result::Result<T, Traced<LoopbackError>>;

/// Two [`RtcPeerConnection`]s connected to each other without any
/// signaling layer: descriptions and ICE candidates are handed over
/// in-process.
pub struct LoopbackPair {
    /// Sending endpoint, owner of the outgoing video track.
    tx: Rc<RtcPeerConnection>,

    /// Receiving endpoint, source of the downstream media stream.
    rx: Rc<RtcPeerConnection>,
}

impl LoopbackPair {
    /// Instantiates both endpoints of a new [`LoopbackPair`].
    ///
    /// # Errors
    ///
    /// Errors if either underlying peer connection cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            tx: Rc::new(
                RtcPeerConnection::new()
                    .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?,
            ),
            rx: Rc::new(
                RtcPeerConnection::new()
                    .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?,
            ),
        })
    }

    /// Transports the first video track of `upstream` from the sending to
    /// the receiving endpoint, returning the stream delivered by the
    /// receiver's track event.
    ///
    /// When `bitrate_kbps` is provided, the SDP answer is rewritten with
    /// [`sdp::limit_bitrate`] before being applied on either side.
    ///
    /// Resolves once the receiving endpoint fires its track event; if
    /// negotiation never completes this pends forever.
    ///
    /// # Errors
    ///
    /// - [`LoopbackError::NoVideoTrack`] if `upstream` has no video track;
    /// - [`LoopbackError::Peer`] if any negotiation step rejects.
    pub async fn start(
        &self,
        upstream: &MediaStream,
        bitrate_kbps: Option<u32>,
    ) -> Result<MediaStream> {
        Self::relay_candidates(&self.tx, &self.rx)?;
        Self::relay_candidates(&self.rx, &self.tx)?;

        let (downstream_tx, downstream_rx) = oneshot::channel();
        let mut downstream_tx = Some(downstream_tx);
        self.rx
            .on_track(Some(move |ev: web_sys::RtcTrackEvent| {
                if let Some(tx) = downstream_tx.take() {
                    let stream = MediaStream::from(ev.streams().get(0));
                    let _ = tx.send(stream);
                }
            }))
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;

        let video_tracks = upstream.get_video_tracks();
        if video_tracks.length() == 0 {
            return Err(tracerr::new!(LoopbackError::NoVideoTrack));
        }
        let track = MediaStreamTrack::from(video_tracks.get(0));
        self.tx.add_track(&track, upstream);

        let offer = self
            .tx
            .create_and_set_offer()
            .await
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;
        self.rx
            .set_remote_description(SdpType::Offer(offer))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;

        let mut answer = self
            .rx
            .create_answer()
            .await
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;
        if let Some(kbps) = bitrate_kbps {
            answer = sdp::limit_bitrate(&answer, kbps);
        }
        self.rx
            .set_local_answer(&answer)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;
        self.tx
            .set_remote_description(SdpType::Answer(answer))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))?;

        downstream_rx
            .await
            .map_err(|_| tracerr::new!(LoopbackError::Dropped))
    }

    /// Returns the outgoing video track of the sending endpoint, once
    /// [`LoopbackPair::start`] has added it.
    pub fn sender_track(&self) -> Option<MediaStreamTrack> {
        self.tx.first_sender_track()
    }

    /// Relays every ICE candidate discovered by `from` straight into `to`,
    /// with no buffering.
    ///
    /// Relay failures are logged: a lost candidate is not fatal for an
    /// in-page loopback, the remaining ones still connect it.
    fn relay_candidates(
        from: &RtcPeerConnection,
        to: &Rc<RtcPeerConnection>,
    ) -> Result<()> {
        let to = Rc::clone(to);
        from.on_ice_candidate(Some(move |candidate: platform::IceCandidate| {
            let to = Rc::clone(&to);
            platform::spawn(async move {
                if let Err(e) = to
                    .add_ice_candidate(
                        &candidate.candidate,
                        candidate.sdp_m_line_index,
                        &candidate.sdp_mid,
                    )
                    .await
                {
                    log::error!("failed to relay ICE candidate: {}", e);
                }
            });
        }))
        .map_err(tracerr::map_from_and_wrap!(=> LoopbackError))
    }
}
