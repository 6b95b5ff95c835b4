// Console output decoding
// Windows tools print in the active ANSI code page. The supported locales are
// English (ASCII, valid UTF-8) and Simplified Chinese (code page 936, i.e. GBK),
// so UTF-8 then GBK covers them without querying the code page at run time.
// Other single-byte code pages come out lossy.
use encoding_rs::{Encoding, GBK, UTF_8};

/// Tries each encoding strictly in order, then falls back to lossy UTF-8
#[derive(Debug, Clone)]
pub struct OutputDecoder {
    encodings: Vec<&'static Encoding>,
}

impl Default for OutputDecoder {
    fn default() -> Self {
        Self::new(vec![UTF_8, GBK])
    }
}

impl OutputDecoder {
    pub fn new(encodings: Vec<&'static Encoding>) -> Self {
        Self { encodings }
    }

    /// Decode and trim. Never fails.
    pub fn decode(&self, bytes: &[u8]) -> String {
        for encoding in &self.encodings {
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes)
            {
                return text.trim().to_string();
            }
        }
        String::from_utf8_lossy(bytes).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_wins_first() {
        let decoder = OutputDecoder::default();
        assert_eq!(decoder.decode("  Wi-Fi 已连接\r\n".as_bytes()), "Wi-Fi 已连接");
    }

    #[test]
    fn test_gbk_fallback() {
        // "网络" in GBK; not valid UTF-8
        let decoder = OutputDecoder::default();
        assert_eq!(decoder.decode(&[0xCD, 0xF8, 0xC2, 0xE7]), "网络");
    }

    #[test]
    fn test_lossy_when_nothing_matches() {
        let decoder = OutputDecoder::default();
        assert_eq!(decoder.decode(&[0xFF, 0x41]), "\u{FFFD}A");
    }

    #[test]
    fn test_unsupported_code_page_degrades_to_lossy() {
        // "Café" in Windows-1252
        let decoder = OutputDecoder::default();
        assert_eq!(decoder.decode(&[0x43, 0x61, 0x66, 0xE9]), "Caf\u{FFFD}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(OutputDecoder::default().decode(b""), "");
    }
}
