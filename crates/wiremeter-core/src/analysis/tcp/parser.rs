use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::TcpError;

/// Directed TCP payload with its flow endpoints.
pub struct TcpSegment<'a> {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

/// Extracts a TCP payload from a link-layer frame.
///
/// Returns `Ok(None)` for frames the pipeline ignores: non-Ethernet
/// link types (raw-IP replay captures excepted), non-IPv4, non-TCP, and
/// segments with no payload bytes.
pub fn parse_tcp_segment(
    linktype: Linktype,
    data: &[u8],
) -> Result<Option<TcpSegment<'_>>, TcpError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(data).map_err(|e| TcpError::Slice(e.to_string()))?
        }
        Linktype::RAW => SlicedPacket::from_ip(data).map_err(|e| TcpError::Slice(e.to_string()))?,
        _ => return Ok(None),
    };

    let net = sliced.net.ok_or(TcpError::MissingNetworkLayer)?;
    let ipv4 = match net {
        NetSlice::Ipv4(ref ipv4) => ipv4,
        NetSlice::Ipv6(_) => return Ok(None),
    };
    let tcp = match sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => tcp,
        _ => return Ok(None),
    };

    let payload = tcp.payload();
    if payload.is_empty() {
        return Ok(None);
    }

    Ok(Some(TcpSegment {
        src_ip: IpAddr::V4(ipv4.header().source_addr()),
        src_port: tcp.source_port(),
        dst_ip: IpAddr::V4(ipv4.header().destination_addr()),
        dst_port: tcp.destination_port(),
        payload,
    }))
}
