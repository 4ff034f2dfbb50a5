//! Registration-driven ISO-BMFF box walker.
//!
//! A [`BoxParser`] is an immutable table from box type to handler, built once
//! with [`BoxParserBuilder`]. Handlers receive the parsed header plus the
//! reader positioned at the box payload, and an explicit caller-owned context
//! for their output. Container handlers recurse with [`children`],
//! [`visual_sample_entry`] or [`sample_description`].
//!
//! After a handler returns, the reader is moved to the declared end of the box
//! if the handler consumed less, so handlers may ignore trailing fields.

use std::collections::HashMap;

use super::BoxType;
use crate::{ByteReader, Result};

/// Fixed-size codec parameter header of a visual sample entry.
const VISUAL_SAMPLE_ENTRY_HEADER: usize = 78;

/// Header layout of a registered box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    /// Plain size + type header.
    Basic,
    /// Size + type followed by a version byte and 24 bits of flags.
    Full,
}

/// Box callback. Receives the header view and the caller's context.
pub type BoxHandler<C> = fn(&mut ParsedBox<'_, '_, C>, &mut C) -> Result<()>;

/// A box whose header has just been consumed.
pub struct ParsedBox<'p, 'd, C> {
    /// Parser that dispatched this box, for recursion.
    pub parser: &'p BoxParser<C>,
    /// Reader positioned at the first payload byte.
    pub reader: &'p mut ByteReader<'d>,
    pub box_type: BoxType,
    /// Offset of the size field.
    pub start: usize,
    /// Total size including the header.
    pub size: usize,
    /// Bytes consumed by the header, including version and flags.
    pub header_size: usize,
    /// Full box version, 0 for basic boxes.
    pub version: u8,
    /// Full box flags, 0 for basic boxes.
    pub flags: u32,
}

impl<C> ParsedBox<'_, '_, C> {
    /// Declared end offset, clamped to the buffer.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.size).min(self.reader.len())
    }

    /// Offset of the first payload byte.
    pub fn payload_start(&self) -> usize {
        self.start + self.header_size
    }

    /// Bytes between the cursor and the declared end of the box.
    pub fn remaining(&self) -> usize {
        self.end().saturating_sub(self.reader.position())
    }

    pub fn has_flag(&self, mask: u32) -> bool {
        self.flags & mask != 0
    }
}

/// Builder collecting `(name, kind, handler)` registrations.
pub struct BoxParserBuilder<C> {
    handlers: HashMap<BoxType, (BoxKind, BoxHandler<C>)>,
}

impl<C> Default for BoxParserBuilder<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<C> BoxParserBuilder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a basic box.
    pub fn basic(self, name: impl Into<BoxType>, handler: BoxHandler<C>) -> Self {
        self.register(name.into(), BoxKind::Basic, handler)
    }

    /// Register a handler for a full box.
    pub fn full(self, name: impl Into<BoxType>, handler: BoxHandler<C>) -> Self {
        self.register(name.into(), BoxKind::Full, handler)
    }

    fn register(mut self, name: BoxType, kind: BoxKind, handler: BoxHandler<C>) -> Self {
        self.handlers.insert(name, (kind, handler));
        self
    }

    pub fn build(self) -> BoxParser<C> {
        BoxParser {
            handlers: self.handlers,
        }
    }
}

/// Immutable dispatch table driving a recursive box walk.
pub struct BoxParser<C> {
    handlers: HashMap<BoxType, (BoxKind, BoxHandler<C>)>,
}

impl<C> BoxParser<C> {
    pub fn builder() -> BoxParserBuilder<C> {
        BoxParserBuilder::new()
    }

    /// Whether a handler is registered for `name`.
    pub fn handles(&self, name: BoxType) -> bool {
        self.handlers.contains_key(&name)
    }

    /// Walk every top-level box in `data`.
    pub fn parse(&self, data: &[u8], ctx: &mut C) -> Result<()> {
        let mut reader = ByteReader::big_endian(data);
        while reader.has_more_data() {
            self.parse_next(&mut reader, ctx)?;
        }
        Ok(())
    }

    /// Consume one box at the reader's position.
    ///
    /// Size 0 extends the box to the end of the buffer and size 1 reads a
    /// 64-bit size after the type. Unregistered boxes are skipped up to their
    /// declared end or the end of the buffer, whichever comes first.
    pub fn parse_next(&self, reader: &mut ByteReader<'_>, ctx: &mut C) -> Result<()> {
        let start = reader.position();
        let size_field = reader.read_u32()?;
        let box_type = BoxType(reader.read_fourcc()?);
        let size = match size_field {
            0 => reader.len() - start,
            1 => reader.read_u64_as_usize()?,
            n => n as usize,
        };

        let Some(&(kind, handler)) = self.handlers.get(&box_type) else {
            let skip = start
                .saturating_add(size)
                .saturating_sub(reader.position())
                .min(reader.remaining());
            tracing::trace!(%box_type, start, size, "skipping unregistered box");
            return reader.skip(skip);
        };

        let (version, flags) = match kind {
            BoxKind::Full => {
                let word = reader.read_u32()?;
                ((word >> 24) as u8, word & 0x00FF_FFFF)
            }
            BoxKind::Basic => (0, 0),
        };

        let header_size = reader.position() - start;
        let mut parsed = ParsedBox {
            parser: self,
            reader: &mut *reader,
            box_type,
            start,
            size,
            header_size,
            version,
            flags,
        };
        handler(&mut parsed, ctx)?;

        let end = start.saturating_add(size).min(reader.len());
        if reader.position() < end {
            reader.seek(end)?;
        }
        Ok(())
    }
}

/// Parse the payload as a sequence of child boxes.
pub fn children<C>(parsed: &mut ParsedBox<'_, '_, C>, ctx: &mut C) -> Result<()> {
    let end = parsed.end();
    while parsed.reader.position() < end {
        parsed.parser.parse_next(parsed.reader, ctx)?;
    }
    Ok(())
}

/// Skip the visual sample entry header, then parse the appended child boxes.
pub fn visual_sample_entry<C>(parsed: &mut ParsedBox<'_, '_, C>, ctx: &mut C) -> Result<()> {
    parsed.reader.skip(VISUAL_SAMPLE_ENTRY_HEADER)?;
    children(parsed, ctx)
}

/// Read an entry count, then parse that many sample entries.
pub fn sample_description<C>(parsed: &mut ParsedBox<'_, '_, C>, ctx: &mut C) -> Result<()> {
    let count = parsed.reader.read_u32()?;
    let end = parsed.end();
    for _ in 0..count {
        if parsed.reader.position() >= end {
            break;
        }
        parsed.parser.parse_next(parsed.reader, ctx)?;
    }
    Ok(())
}
