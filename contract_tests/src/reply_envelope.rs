//! Synchronous reply envelope contract
//!
//! A reply echoes its request's opcode and correlation id; the payload
//! wraps the module's outcome. Both stubs must agree on that wrapping.

#[cfg(test)]
mod tests {
    use ipa_proxy::{decode_reply, encode_reply};
    use ipa_wire::WirePayload;
    use serde_json::Value;

    #[test]
    fn test_ok_envelope_shape() {
        let inner = WirePayload::new(&5u32).unwrap();
        let reply = encode_reply(Ok(inner)).unwrap();

        let value: Value = serde_json::from_slice(reply.as_bytes()).unwrap();
        let ok = value
            .get("result")
            .and_then(|r| r.get("Ok"))
            .expect("Ok outcome no longer nests under result.Ok");
        assert!(ok.is_array(), "Result bytes no longer serialized as an array");
    }

    #[test]
    fn test_fault_envelope_shape() {
        let reply = encode_reply(Err("sensor fault".to_string())).unwrap();

        let value: Value = serde_json::from_slice(reply.as_bytes()).unwrap();
        let err = value
            .get("result")
            .and_then(|r| r.get("Err"))
            .expect("Fault outcome no longer nests under result.Err");
        assert_eq!(err, "sensor fault", "Fault text no longer carried verbatim");
    }

    #[test]
    fn test_envelope_round_trip() {
        let inner = WirePayload::new(&"metadata").unwrap();
        let reply = encode_reply(Ok(inner.clone())).unwrap();
        assert_eq!(decode_reply(&reply).unwrap(), Ok(inner));

        let fault = encode_reply(Err("broken".to_string())).unwrap();
        assert_eq!(decode_reply(&fault).unwrap(), Err("broken".to_string()));
    }
}
