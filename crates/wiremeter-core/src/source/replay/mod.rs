//! Offline replay source.
//!
//! Feeds recorded PCAP/PCAPNG captures through the same pipeline as live
//! traffic. This is the debugging path: capture a session once, replay it
//! until the combat reconstruction is right.

pub(crate) mod error;
mod layout;
mod reader;

use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use error::ReplaySourceError;
use reader::{linktype_for_interface, pcapng_ts_to_seconds, read_magic_and_rewind};

use crate::source::{PacketEvent, PacketSource, SourceError};

/// Packet source backed by a recorded capture file.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use wiremeter_core::{PacketSource, ReplayFileSource};
///
/// let mut source = ReplayFileSource::open(Path::new("session.pcapng"))?;
/// while let Some(event) = source.next_packet()? {
///     let _ = event.data;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ReplayFileSource {
    reader: ReaderKind,
}

enum ReaderKind {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

impl ReplayFileSource {
    /// Opens a PCAP or PCAPNG file, sniffing the format from its magic.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path).map_err(SourceError::from)?;
        let magic = read_magic_and_rewind(&mut file).map_err(SourceError::from)?;

        let reader = if magic == layout::PCAPNG_MAGIC {
            let reader = PcapNGReader::new(layout::READER_BUFFER_SIZE, file)
                .map_err(|e| replay_error("pcapng reader init", e))?;
            ReaderKind::Ng {
                reader,
                linktypes: Vec::new(),
            }
        } else {
            let reader = LegacyPcapReader::new(layout::READER_BUFFER_SIZE, file)
                .map_err(|e| replay_error("pcap reader init", e))?;
            ReaderKind::Legacy {
                reader,
                linktype: None,
            }
        };
        Ok(Self { reader })
    }
}

impl PacketSource for ReplayFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        loop {
            let step = match &mut self.reader {
                ReaderKind::Legacy { reader, linktype } => {
                    poll_blocks(reader, "pcap", |block| match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            *linktype = Some(header.network);
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                            ts: Some(packet.ts_sec as f64 + packet.ts_usec as f64 * 1e-6),
                            linktype: linktype.unwrap_or(Linktype::ETHERNET),
                            data: packet.data.to_vec(),
                        }),
                        _ => None,
                    })
                }
                ReaderKind::Ng { reader, linktypes } => {
                    poll_blocks(reader, "pcapng", |block| match block {
                        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                            linktypes.push(intf.linktype);
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(PacketEvent {
                            ts: Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low)),
                            linktype: linktype_for_interface(linktypes, packet.if_id),
                            data: packet.data.to_vec(),
                        }),
                        _ => None,
                    })
                }
            }?;
            match step {
                Step::Event(event) => return Ok(Some(event)),
                Step::Skipped => {}
                Step::Eof => return Ok(None),
            }
        }
    }
}

enum Step {
    Event(PacketEvent),
    Skipped,
    Eof,
}

fn poll_blocks<R, F>(reader: &mut R, context: &'static str, on_block: F) -> Result<Step, SourceError>
where
    R: PcapReaderIterator,
    F: FnOnce(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    match reader.next() {
        Ok((offset, block)) => {
            let event = on_block(block);
            reader.consume(offset);
            Ok(match event {
                Some(event) => Step::Event(event),
                None => Step::Skipped,
            })
        }
        Err(PcapError::Eof) => Ok(Step::Eof),
        Err(PcapError::Incomplete(_)) => {
            reader
                .refill()
                .map_err(|e| replay_error(context, e))?;
            Ok(Step::Skipped)
        }
        Err(e) => Err(replay_error(context, e)),
    }
}

fn replay_error<E: std::fmt::Display>(context: &'static str, err: E) -> SourceError {
    ReplaySourceError::Pcap {
        context,
        message: err.to_string(),
    }
    .into()
}
