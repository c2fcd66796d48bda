//! P.A.C.K.E.R. deobfuscation
//!
//! Reverses the `eval(function(p,a,c,k,e,d){...}('payload',radix,count,'k1|k2|...'.split('|')))`
//! scheme used by several video hosters to hide their player setup.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Digit alphabet for radixes up to 62
const DIGITS: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

lazy_static! {
    /// Argument list of a packed call: payload, radix, count, keyword list
    static ref PACKED_ARGS: Regex = Regex::new(
        r#"(?s)\}\s*\(\s*'(.*)',\s*(\d+|\[\]),\s*(\d+),\s*'(.*?)'\.split\(\s*'\|'\s*\)"#
    )
    .unwrap();
    static ref PACKED_MARKER: Regex =
        Regex::new(r"eval\s*\(\s*function\s*\(\s*p\s*,\s*a\s*,\s*c\s*,\s*k\s*,\s*e\s*,").unwrap();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script[^>]*>(.*?)</script>").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackerError {
    #[error("radix {0} is outside 2..=62")]
    InvalidRadix(u32),
    #[error("keyword list has {found} entries, expected {expected}")]
    CountMismatch { expected: usize, found: usize },
    #[error("no packed call found")]
    NotPacked,
}

/// Arguments of one packed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArgs {
    pub payload: String,
    pub radix: u32,
    pub count: usize,
    pub keywords: Vec<String>,
}

/// Check whether a page contains a packed call
pub fn detect(source: &str) -> bool {
    PACKED_MARKER.is_match(source)
}

/// Pull the four packer arguments out of page/script text
pub fn extract_args(source: &str) -> Result<PackedArgs, PackerError> {
    let caps = PACKED_ARGS.captures(source).ok_or(PackerError::NotPacked)?;

    let payload = caps
        .get(1)
        .map(|m| m.as_str().replace("\\\\", "\\").replace("\\'", "'"))
        .unwrap_or_default();

    // `[]` is what minifiers emit for the default radix
    let radix = match caps.get(2).map(|m| m.as_str()) {
        Some("[]") | None => 62,
        Some(raw) => raw.parse().map_err(|_| PackerError::NotPacked)?,
    };
    let count = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(PackerError::NotPacked)?;
    let keywords = caps
        .get(4)
        .map(|m| m.as_str().split('|').map(str::to_string).collect())
        .unwrap_or_default();

    Ok(PackedArgs {
        payload,
        radix,
        count,
        keywords,
    })
}

/// Encode a keyword index the way the packer names its tokens
pub fn encode_index(mut index: usize, radix: u32) -> Result<String, PackerError> {
    if !(2..=62).contains(&radix) {
        return Err(PackerError::InvalidRadix(radix));
    }
    let radix = radix as usize;

    let mut digits = Vec::new();
    loop {
        digits.push(DIGITS[index % radix]);
        index /= radix;
        if index == 0 {
            break;
        }
    }
    digits.reverse();

    Ok(String::from_utf8_lossy(&digits).into_owned())
}

/// Decode a packed payload
///
/// Tokens are substituted from the highest index down so that a long token is
/// never partially consumed by a shorter one.
pub fn decode(payload: &str, radix: u32, count: usize, keywords: &[String]) -> Result<String, PackerError> {
    if keywords.len() < count {
        return Err(PackerError::CountMismatch {
            expected: count,
            found: keywords.len(),
        });
    }

    let mut text = payload.to_string();
    for index in (0..count).rev() {
        let keyword = &keywords[index];
        if keyword.is_empty() {
            continue;
        }
        let token = encode_index(index, radix)?;
        text = replace_word(&text, &token, keyword);
    }

    Ok(text)
}

/// Detect, extract and decode in one go
pub fn unpack(source: &str) -> Result<String, PackerError> {
    let args = extract_args(source)?;
    decode(&args.payload, args.radix, args.count, &args.keywords)
}

/// Unpack every packed `<script>` block of a page, in document order.
///
/// Blocks are decoded one at a time; a page without script tags is treated
/// as a single script.
pub fn unpack_scripts(html: &str) -> Vec<String> {
    let blocks: Vec<&str> = SCRIPT_BLOCK
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|body| detect(body))
        .collect();

    if blocks.is_empty() {
        return if detect(html) {
            unpack(html).into_iter().collect()
        } else {
            Vec::new()
        };
    }

    blocks.into_iter().filter_map(|body| unpack(body).ok()).collect()
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replace whole-word occurrences of `word` (JS `\b` semantics)
fn replace_word(haystack: &str, word: &str, replacement: &str) -> String {
    let bytes = haystack.as_bytes();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;

    for (start, _) in haystack.match_indices(word) {
        if start < last {
            continue;
        }
        let end = start + word.len();
        let left_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let right_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        if left_ok && right_ok {
            out.push_str(&haystack[last..start]);
            out.push_str(replacement);
            last = end;
        }
    }
    out.push_str(&haystack[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &str) -> Vec<String> {
        list.split('|').map(str::to_string).collect()
    }

    #[test]
    fn test_encode_index() {
        assert_eq!(encode_index(0, 36).unwrap(), "0");
        assert_eq!(encode_index(35, 36).unwrap(), "z");
        assert_eq!(encode_index(36, 36).unwrap(), "10");
        assert_eq!(encode_index(36, 62).unwrap(), "A");
        assert_eq!(encode_index(61, 62).unwrap(), "Z");
        assert_eq!(encode_index(62, 62).unwrap(), "10");
        assert_eq!(encode_index(5, 2).unwrap(), "101");
    }

    #[test]
    fn test_encode_index_rejects_bad_radix() {
        assert_eq!(encode_index(3, 1), Err(PackerError::InvalidRadix(1)));
        assert_eq!(encode_index(3, 63), Err(PackerError::InvalidRadix(63)));
    }

    #[test]
    fn test_decode_simple() {
        let decoded = decode("1 0=2;3(0)", 4, 4, &words("x|var|5|alert")).unwrap();
        assert_eq!(decoded, "var x=5;alert(x)");
    }

    #[test]
    fn test_decode_is_idempotent_on_plain_text() {
        let keywords = words("x|var|5|alert");
        let decoded = decode("1 0=2;3(0)", 4, 4, &keywords).unwrap();
        let again = decode(&decoded, 4, 4, &keywords).unwrap();
        assert_eq!(again, decoded);
    }

    #[test]
    fn test_decode_longer_tokens_first() {
        // "10" must become "ten", not "<one>0"
        let mut keywords = vec![String::new(); 11];
        keywords[1] = "one".to_string();
        keywords[10] = "ten".to_string();
        let decoded = decode("1 10 1", 10, 11, &keywords).unwrap();
        assert_eq!(decoded, "one ten one");
    }

    #[test]
    fn test_decode_recovers_keywords_at_known_indices() {
        // Build the payload by encoding each keyword index, then decode it back
        let keywords: Vec<String> = (0..100).map(|i| format!("kw{}x", i)).collect();
        let indices = [0usize, 9, 10, 35, 36, 61, 62, 99];
        let payload = indices
            .iter()
            .map(|&i| encode_index(i, 62).unwrap())
            .collect::<Vec<_>>()
            .join(" ");
        let expected = indices
            .iter()
            .map(|&i| keywords[i].clone())
            .collect::<Vec<_>>()
            .join(" ");

        assert_eq!(decode(&payload, 62, 100, &keywords).unwrap(), expected);
    }

    #[test]
    fn test_decode_skips_empty_keywords() {
        let decoded = decode("0.1", 10, 2, &words("|b")).unwrap();
        assert_eq!(decoded, "0.b");
    }

    #[test]
    fn test_decode_count_mismatch() {
        assert_eq!(
            decode("0", 10, 3, &words("a|b")),
            Err(PackerError::CountMismatch { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_replace_word_boundaries() {
        assert_eq!(replace_word("a ab a_ a", "a", "X"), "X ab a_ X");
        assert_eq!(replace_word("m3u8 8", "8", "https"), "m3u8 https");
    }

    #[test]
    fn test_unpack_full_script() {
        let script = r#"<script>eval(function(p,a,c,k,e,d){while(c--)if(k[c])p=p.replace(new RegExp('\\b'+c.toString(a)+'\\b','g'),k[c]);return p}('3 4=5({6:[{7:"8://9.a/b/c.d"}]})',36,14,'|||var|player|setup|sources|file|https|cdn|example|hls2|master|m3u8'.split('|'),0,{}))</script>"#;

        assert!(detect(script));
        let args = extract_args(script).unwrap();
        assert_eq!(args.radix, 36);
        assert_eq!(args.count, 14);
        assert_eq!(
            unpack(script).unwrap(),
            r#"var player=setup({sources:[{file:"https://cdn.example/hls2/master.m3u8"}]})"#
        );
    }

    #[test]
    fn test_extract_args_escaped_quotes() {
        let script = r#"}('0(\'1\')',10,2,'alert|hi'.split('|'),0,{}))"#;
        let args = extract_args(script).unwrap();
        assert_eq!(args.payload, "0('1')");
        assert_eq!(unpack(script).unwrap(), "alert('hi')");
    }

    #[test]
    fn test_unpack_scripts_keeps_blocks_apart() {
        let html = r#"<html>
            <script>eval(function(p,a,c,k,e,d){return p}('0 1',10,2,'hello|world'.split('|'),0,{}))</script>
            <script>var ok = 1;</script>
            <script>eval(function(p,a,c,k,e,d){return p}('1(0)',10,2,'x|alert'.split('|'),0,{}))</script>
        </html>"#;

        assert_eq!(unpack_scripts(html), vec!["hello world".to_string(), "alert(x)".to_string()]);
        assert!(unpack_scripts("<script>var a = 1;</script>").is_empty());
    }

    #[test]
    fn test_not_packed() {
        assert!(!detect("var player = jwplayer();"));
        assert_eq!(unpack("var player = jwplayer();"), Err(PackerError::NotPacked));
    }
}
