//! Event message (`emsg`) extraction from media segments.

use anyhow::{Context, Result};
use mediacheck_media::mp4::{children, parse_emsg, Emsg};
use mediacheck_media::{BoxParser, ParsedBox};
use serde::Serialize;

/// An emsg box as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMessage {
    pub scheme_id_uri: String,
    pub value: String,
    pub timescale: u32,
    pub presentation_time_delta: u64,
    pub event_duration: u32,
    pub id: u32,
    /// Message payload decoded as UTF-8, invalid sequences replaced.
    pub message_data: String,
}

impl From<Emsg> for EventMessage {
    fn from(emsg: Emsg) -> Self {
        Self {
            message_data: String::from_utf8_lossy(&emsg.message_data).into_owned(),
            scheme_id_uri: emsg.scheme_id_uri,
            value: emsg.value,
            timescale: emsg.timescale,
            presentation_time_delta: emsg.presentation_time_delta,
            event_duration: emsg.event_duration,
            id: emsg.id,
        }
    }
}

fn on_emsg(
    parsed: &mut ParsedBox<'_, '_, Vec<EventMessage>>,
    found: &mut Vec<EventMessage>,
) -> mediacheck_media::Result<()> {
    found.push(parse_emsg(parsed)?.into());
    Ok(())
}

/// Collect top-level emsg boxes and any emsg inside `moov`.
pub fn extract_emsg(segment: &[u8]) -> Result<Vec<EventMessage>> {
    let parser = BoxParser::builder()
        .full(b"emsg", on_emsg)
        .basic(b"moov", children)
        .build();
    let mut found = Vec::new();
    parser
        .parse(segment, &mut found)
        .context("Failed to parse segment for emsg")?;
    Ok(found)
}
