//! A DTVCC caption window: a character grid plus a pen.

use mediacheck_common::{Color, Cue, Region, RegionAlign};

use crate::assembler::{assemble, StyledChar, DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR};

/// Rows addressable in a window.
pub const MAX_ROWS: usize = 16;
/// Columns addressable in a 16:9 window.
pub const MAX_COLS: usize = 42;

const LINE_HEIGHT_MULTIPLIER: f64 = 5.33;
const LINE_WIDTH_MULTIPLIER_16_9: f64 = 1.9;

type Row = Vec<Option<StyledChar>>;

fn blank_row() -> Row {
    vec![None; MAX_COLS]
}

/// Text justification from SetWindowAttributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Right,
    Center,
    Full,
}

impl From<u8> for Justification {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => Self::Left,
            1 => Self::Right,
            2 => Self::Center,
            _ => Self::Full,
        }
    }
}

/// Geometry carried by DefineWindow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDefinition {
    pub visible: bool,
    pub vertical_anchor: u8,
    pub horizontal_anchor: u8,
    /// 0 to 8, a point on a 3x3 grid over the window.
    pub anchor_id: u8,
    pub row_count: usize,
    pub col_count: usize,
}

#[derive(Debug, Clone)]
pub struct Window {
    definition: WindowDefinition,
    justification: Justification,
    memory: Vec<Row>,
    start_time: f64,
    row: usize,
    col: usize,
    italics: bool,
    underline: bool,
    text_color: Color,
    background_color: Color,
}

impl Window {
    pub fn new(start_time: f64) -> Self {
        Self {
            definition: WindowDefinition {
                visible: false,
                vertical_anchor: 0,
                horizontal_anchor: 0,
                anchor_id: 0,
                row_count: 0,
                col_count: 0,
            },
            justification: Justification::Center,
            memory: vec![blank_row(); MAX_ROWS],
            start_time,
            row: 0,
            col: 0,
            italics: false,
            underline: false,
            text_color: DEFAULT_TEXT_COLOR,
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }

    pub fn define(&mut self, definition: WindowDefinition) {
        self.definition = definition;
    }

    pub fn is_visible(&self) -> bool {
        self.definition.visible
    }

    pub fn display(&mut self) {
        self.definition.visible = true;
    }

    pub fn hide(&mut self) {
        self.definition.visible = false;
    }

    pub fn toggle(&mut self) {
        self.definition.visible = !self.definition.visible;
    }

    pub fn set_start_time(&mut self, pts: f64) {
        self.start_time = pts;
    }

    pub fn set_justification(&mut self, justification: Justification) {
        self.justification = justification;
    }

    pub fn set_pen_location(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
    }

    pub fn set_pen_style(&mut self, italics: bool, underline: bool) {
        self.italics = italics;
        self.underline = underline;
    }

    pub fn set_pen_color(&mut self, text_color: Color, background_color: Color) {
        self.text_color = text_color;
        self.background_color = background_color;
    }

    /// Home the pen with default attributes.
    pub fn reset_pen(&mut self) {
        self.row = 0;
        self.col = 0;
        self.underline = false;
        self.italics = false;
        self.text_color = DEFAULT_TEXT_COLOR;
        self.background_color = DEFAULT_BACKGROUND_COLOR;
    }

    pub fn reset_memory(&mut self) {
        self.memory = vec![blank_row(); MAX_ROWS];
    }

    fn pen_in_bounds(&self) -> bool {
        self.row < self.definition.row_count.min(MAX_ROWS)
            && self.col < self.definition.col_count.min(MAX_COLS)
    }

    /// Write at the pen and advance one column. Out of bounds writes are dropped.
    pub fn set_character(&mut self, character: &str) {
        if !self.pen_in_bounds() {
            return;
        }
        self.memory[self.row][self.col] = Some(StyledChar {
            character: character.to_string(),
            underline: self.underline,
            italics: self.italics,
            text_color: self.text_color,
            background_color: self.background_color,
        });
        self.col += 1;
    }

    /// Step the pen back, wrapping to the previous row, and erase that cell.
    pub fn backspace(&mut self) {
        if !self.pen_in_bounds() || (self.row == 0 && self.col == 0) {
            return;
        }
        if self.col == 0 {
            self.col = self.definition.col_count.min(MAX_COLS) - 1;
            self.row -= 1;
        } else {
            self.col -= 1;
        }
        self.memory[self.row][self.col] = None;
    }

    /// Next row, scrolling the grid up one row from the last row.
    pub fn carriage_return(&mut self) {
        if self.row + 1 >= self.definition.row_count {
            self.memory.remove(0);
            self.memory.push(blank_row());
        } else {
            self.row += 1;
        }
        self.col = 0;
    }

    /// Clear the pen row and return to its first column.
    pub fn horizontal_carriage_return(&mut self) {
        if let Some(row) = self.memory.get_mut(self.row) {
            *row = blank_row();
        }
        self.col = 0;
    }

    fn region(&self) -> Region {
        let def = &self.definition;
        let anchor = |step: u8| f64::from(step) * 50.0;
        let (region_anchor_x, region_anchor_y) = if def.anchor_id <= 8 {
            (anchor(def.anchor_id % 3), anchor(def.anchor_id / 3))
        } else {
            (0.0, 0.0)
        };
        Region {
            width: def.col_count as f64 * LINE_WIDTH_MULTIPLIER_16_9,
            height: def.row_count as f64 * LINE_HEIGHT_MULTIPLIER,
            region_anchor_x,
            region_anchor_y,
            viewport_anchor_x: f64::from(def.horizontal_anchor),
            viewport_anchor_y: f64::from(def.vertical_anchor),
            align: match self.justification {
                Justification::Left => RegionAlign::Left,
                Justification::Right => RegionAlign::Right,
                Justification::Center | Justification::Full => RegionAlign::Center,
            },
            ..Region::default()
        }
    }

    /// Emit the window contents shown since the start time. On success the
    /// start time moves to `end_time`.
    pub fn force_emit(&mut self, end_time: f64, service_number: u8) -> Option<Cue> {
        let mut cue = Cue::new(self.start_time, end_time, &format!("svc{service_number}"));
        cue.region = Some(self.region());
        let cue = assemble(cue, &self.memory)?;
        self.start_time = end_time;
        Some(cue)
    }

    #[cfg(test)]
    pub(crate) fn row_text(&self, row: usize) -> String {
        self.memory[row]
            .iter()
            .flatten()
            .map(|c| c.character.as_str())
            .collect()
    }
}
