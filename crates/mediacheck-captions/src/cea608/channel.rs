//! Caption mode state machine for one of the four line-21 channels.

use mediacheck_common::Cue;
use tracing::warn;

use super::memory::Memory;
use super::tables::{
    pac_row, CharSet, BACKGROUND_COLORS, CC_ROWS, TEXT_COLORS, WHITE_ITALICS,
};
use crate::assembler::{DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR};

/// Miscellaneous control codes, carried in the second byte.
mod command {
    pub const RCL: u8 = 0x20;
    pub const BS: u8 = 0x21;
    pub const AOF: u8 = 0x22;
    pub const AON: u8 = 0x23;
    pub const DER: u8 = 0x24;
    pub const RU2: u8 = 0x25;
    pub const RU3: u8 = 0x26;
    pub const RU4: u8 = 0x27;
    pub const FON: u8 = 0x28;
    pub const RDC: u8 = 0x29;
    pub const TR: u8 = 0x2A;
    pub const RTD: u8 = 0x2B;
    pub const EDM: u8 = 0x2C;
    pub const CR: u8 = 0x2D;
    pub const ENM: u8 = 0x2E;
    pub const EOC: u8 = 0x2F;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionMode {
    None,
    PopOn,
    PaintOn,
    RollUp,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Buffer {
    Displayed,
    NonDisplayed,
    Text,
}

/// Whether the first byte of a pair (parity stripped or not) is a control code.
pub fn is_control_code(b1: u8) -> bool {
    b1 & 0x70 == 0x10
}

fn is_pac(b1: u8, b2: u8) -> bool {
    b1 & 0xF0 == 0x10 && b2 & 0xC0 == 0x40
}

fn is_midrow(b1: u8, b2: u8) -> bool {
    b1 & 0xF7 == 0x11 && b2 & 0xF0 == 0x20
}

fn is_background_attribute(b1: u8, b2: u8) -> bool {
    (b1 & 0xF7 == 0x10 && b2 & 0xF0 == 0x20) || (b1 & 0xF7 == 0x17 && b2 == 0x2D)
}

fn is_special_char(b1: u8, b2: u8) -> bool {
    b1 & 0xF7 == 0x11 && b2 & 0xF0 == 0x30
}

fn is_extended_char(b1: u8, b2: u8) -> bool {
    b1 & 0xF6 == 0x12 && b2 & 0xE0 == 0x20
}

fn is_miscellaneous(b1: u8, b2: u8) -> bool {
    b1 & 0xF6 == 0x14 && b2 & 0xF0 == 0x20
}

/// One of CC1 to CC4.
#[derive(Debug, Clone)]
pub struct Channel {
    mode: CaptionMode,
    displayed: Memory,
    non_displayed: Memory,
    /// Text mode sink, never emitted.
    text: Memory,
    current: Buffer,
    /// End of the previous cue and start of the next.
    prev_end_time: f64,
    last_control: Option<u16>,
}

impl Channel {
    pub fn new(field: u8, channel: u8) -> Self {
        Self {
            mode: CaptionMode::None,
            displayed: Memory::new(field, channel),
            non_displayed: Memory::new(field, channel),
            text: Memory::new(field, channel),
            current: Buffer::NonDisplayed,
            prev_end_time: 0.0,
            last_control: None,
        }
    }

    pub fn mode(&self) -> CaptionMode {
        self.mode
    }

    fn buffer(&mut self) -> &mut Memory {
        match self.current {
            Buffer::Displayed => &mut self.displayed,
            Buffer::NonDisplayed => &mut self.non_displayed,
            Buffer::Text => &mut self.text,
        }
    }

    /// Seed the start time of the first cue.
    pub fn set_first_pts(&mut self, pts: f64) {
        self.prev_end_time = pts;
    }

    pub fn reset(&mut self) {
        self.mode = CaptionMode::None;
        self.current = Buffer::NonDisplayed;
        self.last_control = None;
        self.displayed.reset();
        self.non_displayed.reset();
        self.text.reset();
    }

    /// Append a pair of basic characters.
    pub fn handle_basic_chars(&mut self, b1: u8, b2: u8) {
        let buf = self.buffer();
        buf.add_char(CharSet::BasicNorthAmerican, b1);
        buf.add_char(CharSet::BasicNorthAmerican, b2);
    }

    /// Apply a control pair with parity already stripped.
    ///
    /// A pair equal to the previous control pair is dropped once, since
    /// broadcasters send every control code twice.
    pub fn handle_control_code(&mut self, b1: u8, b2: u8, pts: f64) -> Option<Cue> {
        let pair = u16::from_be_bytes([b1, b2]);
        if self.last_control == Some(pair) {
            self.last_control = None;
            return None;
        }
        self.last_control = Some(pair);

        if is_pac(b1, b2) {
            self.control_pac(b1, b2);
        } else if is_midrow(b1, b2) {
            self.control_midrow(b2);
        } else if is_background_attribute(b1, b2) {
            self.control_background(b1, b2);
        } else if is_special_char(b1, b2) {
            self.buffer().add_char(CharSet::SpecialNorthAmerican, b2);
        } else if is_extended_char(b1, b2) {
            let set = if b1 & 0x01 != 0 {
                CharSet::PortugueseGerman
            } else {
                CharSet::SpanishFrench
            };
            self.buffer().add_char(set, b2);
        } else if is_miscellaneous(b1, b2) {
            return self.control_miscellaneous(b2, pts);
        }
        None
    }

    fn control_pac(&mut self, b1: u8, b2: u8) {
        let row = pac_row(b1, b2);
        let attr = (b2 & 0x1E) >> 1;
        let underline = b2 & 0x01 != 0;

        // Values above 7 are indents and leave the pen white.
        let (text_color, italics) = match attr {
            a if a < WHITE_ITALICS => (TEXT_COLORS[a as usize], false),
            WHITE_ITALICS => (DEFAULT_TEXT_COLOR, true),
            _ => (DEFAULT_TEXT_COLOR, false),
        };

        if self.mode == CaptionMode::Text {
            return;
        }

        let rolling = self.mode == CaptionMode::RollUp;
        let buf = self.buffer();
        if rolling && row != buf.row() {
            let scroll = buf.scroll_size() as isize;
            let old_top = 1 + buf.row() as isize - scroll;
            let new_top = 1 + row as isize - scroll;
            buf.move_rows(new_top, old_top, buf.scroll_size());
            buf.reset_rows(0, new_top - 1);
            buf.reset_rows(row as isize + 1, (CC_ROWS - row) as isize);
        }
        buf.set_row(row);
        buf.set_underline(underline);
        buf.set_italics(italics);
        buf.set_text_color(text_color);
        buf.set_background_color(DEFAULT_BACKGROUND_COLOR);
    }

    fn control_midrow(&mut self, b2: u8) {
        let buf = self.buffer();
        // The attribute cell itself shows as a space in the old style.
        buf.add_char(CharSet::BasicNorthAmerican, b' ');

        let attr = (b2 & 0x0E) >> 1;
        let (text_color, italics) = match TEXT_COLORS.get(attr as usize) {
            Some(&color) => (color, false),
            None => (DEFAULT_TEXT_COLOR, true),
        };
        buf.set_underline(b2 & 0x01 != 0);
        buf.set_italics(italics);
        buf.set_text_color(text_color);
    }

    fn control_background(&mut self, b1: u8, b2: u8) {
        let color = if b1 & 0x07 == 0 {
            BACKGROUND_COLORS[((b2 & 0x0E) >> 1) as usize]
        } else {
            DEFAULT_BACKGROUND_COLOR
        };
        self.buffer().set_background_color(color);
    }

    fn control_miscellaneous(&mut self, b2: u8, pts: f64) -> Option<Cue> {
        match b2 {
            command::RCL => self.control_rcl(),
            command::BS => self.buffer().erase_char(),
            // Alarms and delete-to-end-of-row have no effect without positioning.
            command::AOF | command::AON | command::DER => {}
            command::RU2 => return self.control_roll_up(2, pts),
            command::RU3 => return self.control_roll_up(3, pts),
            command::RU4 => return self.control_roll_up(4, pts),
            command::FON => self.buffer().add_char(CharSet::BasicNorthAmerican, b' '),
            command::RDC => self.control_rdc(pts),
            command::TR => {
                self.text.reset();
                self.control_rtd();
            }
            command::RTD => self.control_rtd(),
            command::EDM => return self.control_edm(pts),
            command::CR => return self.control_cr(pts),
            command::ENM => self.non_displayed.reset_all_rows(),
            command::EOC => return self.control_eoc(pts),
            _ => {}
        }
        None
    }

    /// Resume caption loading: pop-on into non-displayed memory.
    fn control_rcl(&mut self) {
        self.mode = CaptionMode::PopOn;
        self.current = Buffer::NonDisplayed;
        self.buffer().set_scroll_size(0);
    }

    /// Resume direct captioning: paint-on into displayed memory.
    fn control_rdc(&mut self, pts: f64) {
        self.mode = CaptionMode::PaintOn;
        self.current = Buffer::Displayed;
        self.buffer().set_scroll_size(0);
        self.prev_end_time = pts;
    }

    fn control_roll_up(&mut self, scroll_size: usize, pts: f64) -> Option<Cue> {
        self.current = Buffer::Displayed;
        let mut cue = None;

        if !matches!(self.mode, CaptionMode::RollUp | CaptionMode::Text) {
            cue = self.displayed.force_emit(self.prev_end_time, pts);
            self.displayed.erase_buffer();
            self.non_displayed.erase_buffer();
            self.displayed.set_row(CC_ROWS);
        }
        self.mode = CaptionMode::RollUp;
        self.displayed.set_scroll_size(scroll_size);
        cue
    }

    fn control_rtd(&mut self) {
        warn!("CEA-608 text mode entered, but is unsupported");
        self.current = Buffer::Text;
        self.mode = CaptionMode::Text;
    }

    fn control_edm(&mut self, pts: f64) -> Option<Cue> {
        let cue = if self.mode != CaptionMode::Text {
            self.displayed.force_emit(self.prev_end_time, pts)
        } else {
            None
        };
        self.displayed.reset_all_rows();
        cue
    }

    /// Carriage return. Only roll-up captions scroll and emit.
    fn control_cr(&mut self, pts: f64) -> Option<Cue> {
        if self.mode != CaptionMode::RollUp {
            return None;
        }
        let prev_end_time = self.prev_end_time;
        let buf = self.buffer();
        let cue = buf.force_emit(prev_end_time, pts);

        let row = buf.row() as isize;
        let top_row = row - buf.scroll_size() as isize + 1;
        buf.move_rows(top_row - 1, top_row, buf.scroll_size());
        buf.reset_rows(0, top_row - 1);
        buf.reset_rows(row, CC_ROWS as isize - row);

        self.prev_end_time = pts;
        cue
    }

    /// End of caption: show the loaded caption and flush the old one.
    fn control_eoc(&mut self, pts: f64) -> Option<Cue> {
        let cue = if self.mode != CaptionMode::Text {
            self.displayed.force_emit(self.prev_end_time, pts)
        } else {
            None
        };
        std::mem::swap(&mut self.displayed, &mut self.non_displayed);
        self.control_rcl();
        self.prev_end_time = pts;
        cue
    }
}
