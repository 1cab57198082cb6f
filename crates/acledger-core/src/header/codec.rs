//! Header value encoding and parsing.
//!
//! Wire grammar: `name=value` pairs joined by `;`. The critical attributes
//! are `addr`, `prefer-encrypt` and `keydata`; names starting with `_` are
//! non-critical and kept as-is.

use std::collections::BTreeMap;

use acledger_mime::encoding::{decode_base64_lenient, encode_base64, fold_lines};

use super::model::{AutocryptHeader, HeaderError, PreferEncrypt};
use crate::error::{Error, Result};

/// Maximum Base64 characters per folded `keydata` line.
pub const KEYDATA_LINE_WIDTH: usize = 78;

/// Indentation of folded `keydata` lines.
pub const KEYDATA_INDENT: &str = "  ";

/// Builds an Autocrypt header value.
///
/// Attributes are emitted in fixed order: `addr`, `prefer-encrypt` (only
/// when [`PreferEncrypt::Mutual`]), then `keydata` folded onto indented
/// lines.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if `addr` is empty or contains
/// whitespace or `;`, and [`Error::EmptyKeyMaterial`] if `keydata` is empty.
pub fn encode_header(addr: &str, keydata: &[u8], prefer_encrypt: PreferEncrypt) -> Result<String> {
    if addr.is_empty() || addr.contains(|c: char| c.is_whitespace() || c == ';') {
        return Err(Error::InvalidValue(format!("addr {addr:?}")));
    }
    if keydata.is_empty() {
        return Err(Error::EmptyKeyMaterial);
    }

    let mut attrs = vec![format!("addr={addr}")];
    if prefer_encrypt != PreferEncrypt::NoPreference {
        attrs.push(format!("prefer-encrypt={prefer_encrypt}"));
    }
    let folded = fold_lines(&encode_base64(keydata), KEYDATA_LINE_WIDTH, KEYDATA_INDENT);
    attrs.push(format!("keydata=\n{folded}"));

    Ok(attrs.join("; "))
}

/// Parses an Autocrypt header value.
///
/// The result is either a complete header or the first problem found;
/// there is no partially parsed state.
///
/// # Errors
///
/// Returns a [`HeaderError`] describing why the value was rejected.
pub fn parse_header(value: &str) -> std::result::Result<AutocryptHeader, HeaderError> {
    let segments: Vec<&str> = value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(HeaderError::Empty);
    }

    let mut addr: Option<String> = None;
    let mut keydata: Option<Vec<u8>> = None;
    let mut prefer_encrypt: Option<PreferEncrypt> = None;
    let mut extra_attrs = BTreeMap::new();

    for segment in segments {
        let (name, value) = segment
            .split_once('=')
            .ok_or_else(|| HeaderError::MalformedSetting(segment.to_string()))?;
        let (name, value) = (name.trim(), value.trim());

        match name {
            "addr" => set_once(&mut addr, name, value.to_string())?,
            "prefer-encrypt" => {
                let parsed = PreferEncrypt::parse(value)
                    .ok_or_else(|| HeaderError::UnknownPreferEncrypt(value.to_string()))?;
                set_once(&mut prefer_encrypt, name, parsed)?;
            }
            "keydata" => {
                let decoded =
                    decode_base64_lenient(value).map_err(|_| HeaderError::InvalidKeydata)?;
                if decoded.is_empty() {
                    return Err(HeaderError::EmptyKeydata);
                }
                set_once(&mut keydata, name, decoded)?;
            }
            _ if name.starts_with('_') => {
                extra_attrs.insert(name.to_string(), value.to_string());
            }
            _ => return Err(HeaderError::UnknownCriticalAttr(name.to_string())),
        }
    }

    let keydata = keydata.ok_or(HeaderError::MissingCriticalAttr("keydata"))?;
    let addr = addr.ok_or(HeaderError::MissingCriticalAttr("addr"))?;

    Ok(AutocryptHeader {
        addr,
        keydata,
        prefer_encrypt: prefer_encrypt.unwrap_or_default(),
        extra_attrs,
    })
}

fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> std::result::Result<(), HeaderError> {
    if slot.is_some() {
        return Err(HeaderError::DuplicateAttr(name.to_string()));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: &[u8] = b"\x99\x01\x0d\x04fake-openpgp-public-key-packet";

    mod encode_tests {
        use super::*;

        #[test]
        fn rejects_empty_key() {
            assert!(matches!(
                encode_header("a@example.org", b"", PreferEncrypt::Mutual),
                Err(Error::EmptyKeyMaterial)
            ));
        }

        #[test]
        fn rejects_addr_that_would_not_parse_back() {
            for addr in [
                "",
                "   ",
                "a@example.org\r\nBcc: evil@example.org",
                "a@example.org\nX: y",
                "a;b=c@example.org",
                " a@example.org",
            ] {
                assert!(
                    matches!(
                        encode_header(addr, b"abc", PreferEncrypt::NoPreference),
                        Err(Error::InvalidValue(_))
                    ),
                    "{addr:?} accepted"
                );
            }
        }

        #[test]
        fn addr_may_contain_equals() {
            let value = encode_header("a=b@example.org", b"abc", PreferEncrypt::NoPreference)
                .unwrap();
            assert_eq!(parse_header(&value).unwrap().addr, "a=b@example.org");
        }

        #[test]
        fn attribute_order_and_omitted_preference() {
            let value =
                encode_header("a@example.org", b"abc", PreferEncrypt::NoPreference).unwrap();
            assert_eq!(value, "addr=a@example.org; keydata=\n  YWJj");
        }

        #[test]
        fn mutual_preference_between_addr_and_keydata() {
            let value = encode_header("a@example.org", b"abc", PreferEncrypt::Mutual).unwrap();
            assert_eq!(
                value,
                "addr=a@example.org; prefer-encrypt=mutual; keydata=\n  YWJj"
            );
        }

        #[test]
        fn keydata_wrapped_at_line_width() {
            let key = vec![7u8; 200];
            let value =
                encode_header("a@example.org", &key, PreferEncrypt::NoPreference).unwrap();
            let keydata = value.split_once("keydata=\n").unwrap().1;

            let lines: Vec<&str> = keydata.lines().collect();
            assert!(lines.len() > 1);
            for line in &lines {
                assert!(line.starts_with(KEYDATA_INDENT));
                assert!(line.len() <= KEYDATA_INDENT.len() + KEYDATA_LINE_WIDTH);
            }
            assert_eq!(lines[0].len(), KEYDATA_INDENT.len() + KEYDATA_LINE_WIDTH);
            assert!(!value.ends_with(char::is_whitespace));
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn minimal_header() {
            let header = parse_header("addr=a@example.org; keydata=YWJj").unwrap();
            assert_eq!(header.addr, "a@example.org");
            assert_eq!(header.keydata, b"abc");
            assert_eq!(header.prefer_encrypt, PreferEncrypt::NoPreference);
            assert!(header.extra_attrs.is_empty());
        }

        #[test]
        fn folded_keydata_and_extra_attrs() {
            let header = parse_header(concat!(
                " addr=a@example.org ;prefer-encrypt=mutual; _comment=hi there;",
                "\n keydata=\n  YW\n  Jj ;",
            ))
            .unwrap();
            assert_eq!(header.keydata, b"abc");
            assert_eq!(header.prefer_encrypt, PreferEncrypt::Mutual);
            assert_eq!(header.extra_attrs.get("_comment").unwrap(), "hi there");
        }

        #[test]
        fn value_may_contain_equals() {
            let header = parse_header("addr=a@example.org; keydata=YQ==").unwrap();
            assert_eq!(header.keydata, b"a");
        }

        #[test]
        fn empty_header() {
            assert_eq!(parse_header(""), Err(HeaderError::Empty));
            assert_eq!(parse_header(" ; ;  "), Err(HeaderError::Empty));
        }

        #[test]
        fn malformed_setting() {
            assert_eq!(
                parse_header("addr=a@example.org; keydata"),
                Err(HeaderError::MalformedSetting("keydata".into()))
            );
        }

        #[test]
        fn unknown_prefer_encrypt() {
            assert_eq!(
                parse_header("addr=a@example.org; prefer-encrypt=yes; keydata=YWJj"),
                Err(HeaderError::UnknownPreferEncrypt("yes".into()))
            );
        }

        #[test]
        fn bad_base64() {
            assert_eq!(
                parse_header("addr=a@example.org; keydata=!!!"),
                Err(HeaderError::InvalidKeydata)
            );
        }

        #[test]
        fn empty_keydata() {
            assert_eq!(
                parse_header("addr=a@example.org; keydata="),
                Err(HeaderError::EmptyKeydata)
            );
        }

        #[test]
        fn unknown_critical_attr() {
            assert_eq!(
                parse_header("addr=a@example.org; foo=bar; keydata=YWJj"),
                Err(HeaderError::UnknownCriticalAttr("foo".into()))
            );
        }

        #[test]
        fn duplicate_addr() {
            assert_eq!(
                parse_header("addr=a@example.org; addr=b@example.org; keydata=YWJj"),
                Err(HeaderError::DuplicateAttr("addr".into()))
            );
        }

        #[test]
        fn missing_critical_attrs() {
            assert_eq!(
                parse_header("addr=a@example.org"),
                Err(HeaderError::MissingCriticalAttr("keydata"))
            );
            assert_eq!(
                parse_header("keydata=YWJj"),
                Err(HeaderError::MissingCriticalAttr("addr"))
            );
        }

        #[test]
        fn encoded_own_header_parses() {
            let value = encode_header("me@example.org", KEY, PreferEncrypt::Mutual).unwrap();
            let header = parse_header(&value).unwrap();
            assert_eq!(header.keydata, KEY);
            assert_eq!(header.addr, "me@example.org");
        }
    }

    fn prefer_strategy() -> impl Strategy<Value = PreferEncrypt> {
        prop_oneof![Just(PreferEncrypt::NoPreference), Just(PreferEncrypt::Mutual)]
    }

    proptest! {
        #[test]
        fn encode_parse_round_trip(
            local in "[a-z0-9._-]{1,20}",
            key in proptest::collection::vec(any::<u8>(), 1..600),
            prefer in prefer_strategy(),
        ) {
            let addr = format!("{local}@example.org");
            let header = parse_header(&encode_header(&addr, &key, prefer).unwrap()).unwrap();
            prop_assert_eq!(header.addr, addr);
            prop_assert_eq!(header.keydata, key);
            prop_assert_eq!(header.prefer_encrypt, prefer);
        }

        #[test]
        fn unknown_critical_attr_always_rejected(
            name in "[a-z][a-z0-9-]{0,12}",
            position in 0usize..3,
        ) {
            prop_assume!(!matches!(name.as_str(), "addr" | "keydata" | "prefer-encrypt"));
            let mut attrs = vec![
                "addr=a@example.org".to_string(),
                "prefer-encrypt=mutual".to_string(),
                "keydata=YWJj".to_string(),
            ];
            attrs.insert(position, format!("{name}=value"));
            let result = parse_header(&attrs.join("; "));
            prop_assert_eq!(result, Err(HeaderError::UnknownCriticalAttr(name)));
        }
    }
}
