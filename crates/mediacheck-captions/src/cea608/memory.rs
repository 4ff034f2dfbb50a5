//! A 16-row caption memory with the current pen state.

use mediacheck_common::{Color, Cue};

use super::tables::{row_to_line, CharSet, CC_ROWS};
use crate::assembler::{assemble, StyledChar, DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR};

type Row = Vec<Option<StyledChar>>;

#[derive(Debug, Clone)]
pub struct Memory {
    field: u8,
    channel: u8,
    rows: Vec<Row>,
    row: usize,
    /// Roll-up window height, 0 outside roll-up mode.
    scroll_rows: usize,
    underline: bool,
    italics: bool,
    text_color: Color,
    background_color: Color,
}

impl Memory {
    pub fn new(field: u8, channel: u8) -> Self {
        let mut memory = Self {
            field,
            channel,
            rows: vec![Row::new(); CC_ROWS + 1],
            row: 1,
            scroll_rows: 0,
            underline: false,
            italics: false,
            text_color: DEFAULT_TEXT_COLOR,
            background_color: DEFAULT_BACKGROUND_COLOR,
        };
        memory.reset();
        memory
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    pub fn scroll_size(&self) -> usize {
        self.scroll_rows
    }

    pub fn set_scroll_size(&mut self, rows: usize) {
        self.scroll_rows = rows;
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.underline = underline;
    }

    pub fn set_italics(&mut self, italics: bool) {
        self.italics = italics;
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
    }

    /// Stream label, `CC1` to `CC4`.
    pub fn stream(&self) -> String {
        format!("CC{}", (self.field << 1) + self.channel + 1)
    }

    /// Build a cue from the buffer contents displayed between `start` and `end`.
    pub fn force_emit(&self, start: f64, end: f64) -> Option<Cue> {
        let mut cue = Cue::new(start, end, &self.stream());
        cue.position = row_to_line(self.row);
        assemble(cue, &self.rows)
    }

    /// Blank every row and home the cursor to row 1.
    pub fn reset(&mut self) {
        self.reset_all_rows();
        self.row = 1;
    }

    /// Append a character from `set` to the current row. Codes outside
    /// 0x20..=0x7F are ignored.
    pub fn add_char(&mut self, set: CharSet, b: u8) {
        if !(0x20..=0x7F).contains(&b) {
            return;
        }
        if set.replaces_previous() {
            self.erase_char();
        }
        let Some(glyph) = set.glyph(b) else {
            return;
        };
        let styled = StyledChar {
            character: glyph.to_string(),
            underline: self.underline,
            italics: self.italics,
            text_color: self.text_color,
            background_color: self.background_color,
        };
        if let Some(row) = self.rows.get_mut(self.row) {
            row.push(Some(styled));
        }
    }

    /// Drop the last character of the current row.
    pub fn erase_char(&mut self) {
        if let Some(row) = self.rows.get_mut(self.row) {
            row.pop();
        }
    }

    /// Copy `count` rows starting at `src` to `dst`. Negative indices are a no-op.
    pub fn move_rows(&mut self, dst: isize, src: isize, count: usize) {
        if src < 0 || dst < 0 {
            return;
        }
        let (dst, src) = (dst as usize, src as usize);
        let mut copy = |i: usize| {
            if let Some(source) = self.rows.get(src + i).cloned() {
                if let Some(target) = self.rows.get_mut(dst + i) {
                    *target = source;
                }
            }
        };
        if dst >= src {
            (0..count).rev().for_each(&mut copy);
        } else {
            (0..count).for_each(&mut copy);
        }
    }

    /// Blank rows `idx..=idx + count`. A negative count blanks nothing.
    pub fn reset_rows(&mut self, idx: isize, count: isize) {
        for i in 0..=count {
            let Ok(row) = usize::try_from(idx + i) else {
                continue;
            };
            if let Some(row) = self.rows.get_mut(row) {
                row.clear();
            }
        }
    }

    pub fn reset_all_rows(&mut self) {
        self.reset_rows(0, CC_ROWS as isize);
    }

    /// Blank the buffer and move to the top of the scroll window, keeping
    /// the scroll size.
    pub fn erase_buffer(&mut self) {
        self.row = self.scroll_rows;
        self.reset_all_rows();
    }

    #[cfg(test)]
    pub(crate) fn row_text(&self, row: usize) -> String {
        self.rows[row]
            .iter()
            .flatten()
            .map(|c| c.character.as_str())
            .collect()
    }
}
