use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub text: String,
    pub encoding_label: String,
    /// Some bytes were replaced with U+FFFD.
    pub lossy: bool,
}

/// Decode a response body to UTF-8: BOM -> Content-Type charset -> chardetng guess.
///
/// Malformed sequences are replaced rather than rejected; a posting page is
/// only searched for markers, so partial text is still useful.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedBody {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedBody {
    let (text, used, lossy) = encoding.decode(bytes);
    DecodedBody {
        text: text.into_owned(),
        encoding_label: used.name().to_string(),
        lossy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_is_honoured() {
        let bytes = [b'c', b'a', b'f', 0xE9];
        let decoded = decode_body(&bytes, Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(decoded.text, "café");
        assert!(!decoded.lossy);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let bytes = [0xEF, 0xBB, 0xBF, b'o', b'k', 0xFF];
        let decoded = decode_body(&bytes, None);
        assert_eq!(decoded.encoding_label, "UTF-8");
        assert!(decoded.text.starts_with("ok"));
        assert!(decoded.lossy);
    }
}
