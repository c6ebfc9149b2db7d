// src/mediatype.rs

//! Media type string validation.
//!
//! The registry never consults an IANA registry; a type is "recognized"
//! when it is a syntactically valid `type/subtype` pair of RFC 6838 token
//! characters. Types that are well-formed but declared by no engine yield
//! an empty candidate list, while malformed strings are reported as an
//! error so callers can tell a typo from a genuine capability gap.

/// Whether `media_type` is a well-formed `type/subtype` string.
pub fn is_valid(media_type: &str) -> bool {
    let Some((main, sub)) = media_type.split_once('/') else {
        return false;
    };
    is_token(main) && is_token(sub)
}

// RFC 6838 restricted-name characters, leading character relaxed to any
// token character (engines declare types like "x-world/x-vrml").
fn is_token(part: &str) -> bool {
    !part.is_empty()
        && part.len() <= 127
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
}
