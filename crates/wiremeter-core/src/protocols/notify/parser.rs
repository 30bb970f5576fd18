use super::error::NotifyError;
use super::layout;

/// Parsed notify routing header plus the untouched schema body.
///
/// The body may still be compressed; the envelope's compression bit
/// covers the bytes after this header, so decompression happens after
/// the service filter has decided the frame matters at all.
#[derive(Debug)]
pub struct Notify<'a> {
    pub service_id: u64,
    pub stub_id: u32,
    pub method_id: u32,
    pub body: &'a [u8],
}

pub fn parse_notify(payload: &[u8]) -> Result<Notify<'_>, NotifyError> {
    if payload.len() < layout::HEADER_LEN {
        return Err(NotifyError::TooShort {
            needed: layout::HEADER_LEN,
            actual: payload.len(),
        });
    }
    let service = &payload[layout::SERVICE_ID_RANGE];
    let stub = &payload[layout::STUB_ID_RANGE];
    let method = &payload[layout::METHOD_ID_RANGE];
    Ok(Notify {
        service_id: u64::from_be_bytes([
            service[0], service[1], service[2], service[3], service[4], service[5], service[6],
            service[7],
        ]),
        stub_id: u32::from_be_bytes([stub[0], stub[1], stub[2], stub[3]]),
        method_id: u32::from_be_bytes([method[0], method[1], method[2], method[3]]),
        body: &payload[layout::HEADER_LEN..],
    })
}

#[cfg(test)]
mod tests {
    use super::parse_notify;
    use crate::protocols::notify::error::NotifyError;
    use crate::protocols::notify::layout;

    #[test]
    fn parse_routing_keys() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&layout::COMBAT_SERVICE_ID.to_be_bytes());
        payload.extend_from_slice(&7u32.to_be_bytes());
        payload.extend_from_slice(&layout::method::SYNC_NEAR_DELTA_INFO.to_be_bytes());
        payload.extend_from_slice(b"schema-bytes");

        let notify = parse_notify(&payload).unwrap();
        assert_eq!(notify.service_id, layout::COMBAT_SERVICE_ID);
        assert_eq!(notify.stub_id, 7);
        assert_eq!(notify.method_id, layout::method::SYNC_NEAR_DELTA_INFO);
        assert_eq!(notify.body, b"schema-bytes");
    }

    #[test]
    fn empty_body_is_valid() {
        let mut payload = vec![0u8; layout::HEADER_LEN];
        payload[..8].copy_from_slice(&1u64.to_be_bytes());
        let notify = parse_notify(&payload).unwrap();
        assert_eq!(notify.service_id, 1);
        assert!(notify.body.is_empty());
    }

    #[test]
    fn short_header_rejected() {
        let err = parse_notify(&[0u8; 15]).unwrap_err();
        assert!(matches!(err, NotifyError::TooShort { .. }));
    }
}
