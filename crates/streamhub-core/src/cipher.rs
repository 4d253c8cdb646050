//! Envelope cipher for gateway responses
//!
//! Every gateway endpoint except login wraps its JSON payload in a
//! hex-encoded AES-256-CBC ciphertext under the `eData` field. The key
//! and IV are fixed constants compiled into the client; the key ships as
//! a reversed base64 string. This is an obfuscation layer the client is
//! expected to undo, not a security boundary.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde_json::Value;
use tracing::trace;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Envelope key, stored reversed-then-base64 to keep the raw bytes out of
/// the binary's string table.
const OBFUSCATED_KEY: &str = "gTOwkDMjlDZ0EjY58GcsVWM4oGOllnd4VzN3UmZsBHc";

/// Fixed initialization vector for every envelope.
const ENVELOPE_IV: &[u8; 16] = b"fpmjlrbhpljoennm";

/// Recover the 32-byte envelope key: reverse the obfuscated string, then
/// base64-decode it.
fn envelope_key() -> Option<[u8; 32]> {
    let reversed: String = OBFUSCATED_KEY.chars().rev().collect();
    let raw = STANDARD_NO_PAD.decode(reversed).ok()?;
    raw.try_into().ok()
}

/// Decrypt a hex-encoded envelope into its JSON payload.
///
/// Never fails loudly: malformed hex, bad padding, non-UTF-8 plaintext,
/// or invalid JSON all yield `None`, and callers treat `None` as "no
/// data".
pub fn decrypt_envelope(ciphertext_hex: &str) -> Option<Value> {
    if ciphertext_hex.is_empty() {
        return None;
    }
    let ciphertext = hex::decode(ciphertext_hex).ok()?;
    let key = envelope_key()?;
    let plaintext = Aes256CbcDec::new(&key.into(), ENVELOPE_IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .ok()?;
    let text = String::from_utf8(plaintext).ok()?;
    trace!(bytes = text.len(), "envelope decrypted");
    serde_json::from_str(&text).ok()
}

/// Encrypt a JSON payload into the hex envelope form.
///
/// The client only ever decrypts in production; this companion exists so
/// fixtures and round-trip tests can be produced with the same constants.
pub fn encrypt_envelope(payload: &Value) -> Option<String> {
    let key = envelope_key()?;
    let ciphertext = Aes256CbcEnc::new(&key.into(), ENVELOPE_IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(payload.to_string().as_bytes());
    Some(hex::encode(ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Produced with the envelope key/IV above over the literal JSON in
    // each assertion.
    const STREAM_FIXTURE_HEX: &str = "0fa6467138c27c372cd60fda074eb13d99f4c58f8f4c38a05fe3d920faf6367e273fcd656ecdd3de026be9c101ee41cf";
    const CHANNELS_FIXTURE_HEX: &str = "61e9537820e0c5ecd7de2672dd63c3424297c0f8c4500a0b877d2cf83376d546bf51b2af573fae466312db1559ccd9313593f5e5c4c5b995cee0c9b1b1aaaa646f203410ce72172c834bf76d1c6941e9a403d017ac1e038f43e7fd72edbf0d85a059207323c751ca25c56b0f443c445d7181b8021a0769c553bf85ab262a5769";

    #[test]
    fn key_derivation_yields_32_bytes() {
        let key = envelope_key().unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(&key, b"pplfe775xvye8j81elpo9b14d9c09098");
    }

    #[test]
    fn decrypts_stream_fixture() {
        let payload = decrypt_envelope(STREAM_FIXTURE_HEX).unwrap();
        assert_eq!(
            payload,
            json!({"data": {"HlsUrl": "https://x/master.m3u8"}})
        );
    }

    #[test]
    fn decrypts_channels_fixture() {
        let payload = decrypt_envelope(CHANNELS_FIXTURE_HEX).unwrap();
        assert_eq!(
            payload,
            json!({"data": {"channels": [{
                "id": 7,
                "channelName": "ESPN HD",
                "logo": "https://cdn.example.com/espn.png",
                "channelSlug": "espn"
            }]}})
        );
    }

    #[test]
    fn garbage_inputs_yield_none() {
        assert!(decrypt_envelope("").is_none());
        assert!(decrypt_envelope("not hex at all").is_none());
        assert!(decrypt_envelope("abc").is_none()); // odd length
        assert!(decrypt_envelope("deadbeef").is_none()); // not a block multiple
        // Valid hex, valid block size, but random bytes: padding check fails
        // or the plaintext is not JSON.
        assert!(decrypt_envelope(&"00".repeat(32)).is_none());
    }

    #[test]
    fn round_trip() {
        let payload = json!({"data": {"slider": [], "chunks": [{"categoryName": "Trending"}]}});
        let hex = encrypt_envelope(&payload).unwrap();
        assert_eq!(decrypt_envelope(&hex).unwrap(), payload);
    }
}
