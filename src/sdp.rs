//! Textual rewriting of SDP session descriptions.

/// Inserts a [`b=AS`][1] bandwidth cap line after every `a=mid:` media
/// section identifier line of the provided SDP text.
///
/// Pure text transform: no validation of the surrounding content is
/// performed and all other lines are left byte-for-byte intact. Media
/// identifier lines are expected to be CRLF-terminated, as produced by
/// browser peer connections; lines with other terminators are not touched.
///
/// [1]: https://tools.ietf.org/html/rfc4566#section-5.8
#[must_use]
pub fn limit_bitrate(sdp: &str, kbps: u32) -> String {
    let mut out = String::with_capacity(sdp.len() + 16);
    let mut rest = sdp;
    while let Some(pos) = rest.find("\r\n") {
        let (line, tail) = rest.split_at(pos + 2);
        out.push_str(line);
        if line.starts_with("a=mid:") {
            out.push_str(&format!("b=AS:{}\r\n", kbps));
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::limit_bitrate;

    const ANSWER: &str = "v=0\r\n\
                          o=- 461606677740281307 2 IN IP4 127.0.0.1\r\n\
                          s=-\r\n\
                          t=0 0\r\n\
                          a=group:BUNDLE 0\r\n\
                          m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n\
                          c=IN IP4 0.0.0.0\r\n\
                          a=mid:0\r\n\
                          a=recvonly\r\n\
                          a=rtpmap:96 VP8/90000\r\n";

    #[test]
    fn inserts_bandwidth_line_after_mid_line() {
        let limited = limit_bitrate(ANSWER, 75);

        assert!(limited.contains("a=mid:0\r\nb=AS:75\r\n"));
        assert_eq!(limited.matches("b=AS:").count(), 1);
    }

    #[test]
    fn caps_every_media_section() {
        let sdp = format!(
            "{}m=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:1\r\na=recvonly\r\n",
            ANSWER
        );

        let limited = limit_bitrate(&sdp, 50);

        assert_eq!(limited.matches("b=AS:50\r\n").count(), 2);
        assert!(limited.contains("a=mid:0\r\nb=AS:50\r\n"));
        assert!(limited.contains("a=mid:1\r\nb=AS:50\r\n"));
    }

    #[test]
    fn leaves_other_lines_untouched() {
        let limited = limit_bitrate(ANSWER, 75);

        assert_eq!(limited.replace("b=AS:75\r\n", ""), ANSWER);
    }

    #[test]
    fn sdp_without_mid_lines_is_returned_unchanged() {
        let sdp = "v=0\r\ns=-\r\nt=0 0\r\n";

        assert_eq!(limit_bitrate(sdp, 75), sdp);
    }

    #[test]
    fn lf_terminated_mid_lines_are_not_matched() {
        let sdp = "a=mid:0\na=recvonly\n";

        assert_eq!(limit_bitrate(sdp, 75), sdp);
    }
}
