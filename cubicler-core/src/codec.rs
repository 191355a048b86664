//! Function-name codec: maps `(server_identifier, server_primary_string)` to a
//! stable 6-character base36 hash, and mangles/unmangles tool names as
//! `{hash6}_{snake_case_function}`.

use sha2::{Digest, Sha256};
use thiserror::Error;

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const HASH_LEN: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid tool name: {0:?}")]
    InvalidName(String),
}

/// Hashes `identifier + "\0" + primary` into a 6-char lowercase base36 string.
///
/// Truncates the SHA-256 digest to its first 8 bytes, reads it as a big-endian
/// `u64`, and re-bases that into base36, left-padding with `'0'` to `HASH_LEN`.
pub fn hash6(identifier: &str, primary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(b"\0");
    hasher.update(primary.as_bytes());
    let digest = hasher.finalize();

    let mut n = u64::from_be_bytes(digest[0..8].try_into().expect("8 bytes"));
    let mut out = [0u8; HASH_LEN];
    for slot in out.iter_mut().rev() {
        *slot = BASE36_ALPHABET[(n % 36) as usize];
        n /= 36;
    }
    String::from_utf8(out.to_vec()).expect("base36 alphabet is ascii")
}

/// Converts `camelCase`/`PascalCase` to `snake_case`: lowercase, splitting at
/// every lower→upper boundary.
pub fn snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;
    for c in input.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        prev_lower = c.is_lowercase() || c.is_numeric();
    }
    out
}

/// Builds the mangled, agent-facing tool name for a provider tool.
pub fn encode(identifier: &str, primary: &str, function_name: &str) -> String {
    format!("{}_{}", hash6(identifier, primary), snake_case(function_name))
}

/// Splits a mangled tool name into its hash and function parts.
///
/// The hash must be exactly 6 lowercase base36 characters; the function part
/// must be non-empty.
pub fn decode(name: &str) -> Result<(&str, &str), NameError> {
    let (hash, rest) = name
        .split_once('_')
        .ok_or_else(|| NameError::InvalidName(name.to_string()))?;
    if hash.len() != HASH_LEN
        || !hash.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
    {
        return Err(NameError::InvalidName(name.to_string()));
    }
    if rest.is_empty() {
        return Err(NameError::InvalidName(name.to_string()));
    }
    Ok((hash, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_six_lowercase_base36_chars() {
        let a = hash6("weather_service", "http://localhost:4000/mcp");
        let b = hash6("weather_service", "http://localhost:4000/mcp");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_LEN);
        assert!(a.bytes().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn hash_does_not_depend_on_unrelated_ordering() {
        // Same inputs computed in any order produce the same hash; declaration
        // order of other providers is not an input at all.
        let h1 = hash6("a", "url-a");
        let h2 = hash6("b", "url-b");
        assert_eq!(h1, hash6("a", "url-a"));
        assert_eq!(h2, hash6("b", "url-b"));
        assert_ne!(h1, h2);
    }

    #[test]
    fn snake_case_splits_camel_and_pascal_case() {
        assert_eq!(snake_case("getWeather"), "get_weather");
        assert_eq!(snake_case("GetWeatherNow"), "get_weather_now");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case("HTTPStatus"), "h_t_t_p_status");
    }

    #[test]
    fn encode_matches_hash_underscore_snake_pattern() {
        let name = encode("weather_service", "http://localhost:4000/mcp", "getWeather");
        let re_hash = hash6("weather_service", "http://localhost:4000/mcp");
        assert_eq!(name, format!("{re_hash}_get_weather"));
    }

    #[test]
    fn decode_round_trips_encode() {
        let name = encode("svc", "primary", "doThing");
        let (hash, func) = decode(&name).unwrap();
        assert_eq!(hash, hash6("svc", "primary"));
        assert_eq!(func, "do_thing");
    }

    #[test]
    fn decode_rejects_malformed_names() {
        assert!(decode("short_fn").is_err());
        assert!(decode("abcdef").is_err());
        assert!(decode("ABCDEF_fn").is_err());
        assert!(decode("abcdef_").is_err());
    }

    #[test]
    fn decode_rejects_literal_builtin_names_because_their_prefix_is_not_a_valid_hash() {
        // "cubicler" is 8 chars, not a 6-char hash, so decode correctly fails;
        // callers must check the literal `cubicler_` prefix before calling decode.
        assert!(decode("cubicler_available_servers").is_err());
    }
}
