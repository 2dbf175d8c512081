//! Reply envelope for synchronous operations
//!
//! A reply echoes its request's opcode and correlation id; the payload
//! wraps either the serialized result or a fault description.

use ipa_wire::{WireError, WirePayload};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct ReplyBody {
    result: Result<Vec<u8>, String>,
}

/// Encodes a synchronous call's outcome into a reply payload
pub fn encode_reply(outcome: Result<WirePayload, String>) -> Result<WirePayload, WireError> {
    let body = ReplyBody {
        result: outcome.map(WirePayload::into_bytes),
    };
    WirePayload::new(&body)
}

/// Decodes a reply payload into the call's outcome
///
/// The outer `Err` is a malformed reply envelope; the inner `Err` is a
/// fault reported by the module.
pub fn decode_reply(payload: &WirePayload) -> Result<Result<WirePayload, String>, WireError> {
    let body: ReplyBody = payload.deserialize()?;
    Ok(body.result.map(WirePayload::from_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_reply_round_trip() {
        let result = WirePayload::new(&42u32).unwrap();
        let reply = encode_reply(Ok(result.clone())).unwrap();

        let decoded = decode_reply(&reply).unwrap().unwrap();
        assert_eq!(decoded, result);
        assert_eq!(decoded.deserialize::<u32>().unwrap(), 42);
    }

    #[test]
    fn test_fault_reply_round_trip() {
        let reply = encode_reply(Err("sensor not configured".to_string())).unwrap();
        let decoded = decode_reply(&reply).unwrap();
        assert_eq!(decoded, Err("sensor not configured".to_string()));
    }

    #[test]
    fn test_malformed_reply_rejected() {
        let garbage = WirePayload::from_bytes(vec![0x01, 0x02]);
        assert!(matches!(
            decode_reply(&garbage),
            Err(WireError::MalformedPayload(_))
        ));
    }
}
