//! A DTVCC caption service and its command set.

use mediacheck_common::Cue;

use super::packet::DtvccPacket;
use super::tables::{g0, g1, g2, g3, quantize_color};
use super::window::{Justification, Window, WindowDefinition};
use crate::Result;

/// First byte of a two-byte extended code.
const EXT1: u8 = 0x10;

const BS: u16 = 0x08;
const FF: u16 = 0x0C;
const CR: u16 = 0x0D;
const HCR: u16 = 0x0E;

const CLW: u16 = 0x88;
const DSW: u16 = 0x89;
const HDW: u16 = 0x8A;
const TGW: u16 = 0x8B;
const DLW: u16 = 0x8C;
const DLY: u16 = 0x8D;
const RST: u16 = 0x8F;
const SPA: u16 = 0x90;
const SPC: u16 = 0x91;
const SPL: u16 = 0x92;
const SWA: u16 = 0x97;

/// One of up to 63 caption services, each owning eight windows.
#[derive(Debug, Clone)]
pub struct Service {
    number: u8,
    windows: [Option<Window>; 8],
    current: Option<usize>,
}

impl Service {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            windows: Default::default(),
            current: None,
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Drop every window.
    pub fn clear(&mut self) {
        self.windows = Default::default();
        self.current = None;
    }

    fn current_window(&mut self) -> Option<&mut Window> {
        self.windows.get_mut(self.current?)?.as_mut()
    }

    /// Decode one code and its parameters from `packet`, pushing any cues
    /// it flushes to `out`.
    pub fn handle_control_code(&mut self, packet: &mut DtvccPacket, out: &mut Vec<Cue>) -> Result<()> {
        let byte = packet.read_byte()?;
        let pts = byte.pts;
        let code = if byte.value == EXT1 {
            u16::from_be_bytes([EXT1, packet.read_byte()?.value])
        } else {
            u16::from(byte.value)
        };
        let low = (code & 0xFF) as u8;

        match code {
            0x00..=0x1F => self.handle_c0(code, pts, out),
            0x20..=0x7F => self.write(&g0(low)),
            0x80..=0x9F => self.handle_c1(packet, code, pts, out)?,
            0xA0..=0xFF => self.write(&g1(low)),
            0x1000..=0x101F => packet.skip(c2_parameter_len(low)),
            0x1020..=0x107F => self.write(g2(low)),
            0x1080..=0x109F => packet.skip(c3_parameter_len(low)),
            0x10A0..=0x10FF => self.write(g3(low)),
            _ => {}
        }
        Ok(())
    }

    fn write(&mut self, character: &str) {
        if let Some(window) = self.current_window() {
            window.set_character(character);
        }
    }

    /// C0 carries ASCII-like format effectors. End-of-text and the
    /// parameterised codes are not acted on.
    fn handle_c0(&mut self, code: u16, pts: f64, out: &mut Vec<Cue>) {
        let number = self.number;
        let Some(window) = self.current_window() else {
            return;
        };
        match code {
            BS => window.backspace(),
            CR => {
                out.extend(emit_if_visible(window, pts, number));
                window.carriage_return();
            }
            HCR => {
                out.extend(emit_if_visible(window, pts, number));
                window.horizontal_carriage_return();
            }
            FF => {
                out.extend(emit_if_visible(window, pts, number));
                window.reset_memory();
                window.set_pen_location(0, 0);
            }
            _ => {}
        }
    }

    fn handle_c1(
        &mut self,
        packet: &mut DtvccPacket,
        code: u16,
        pts: f64,
        out: &mut Vec<Cue>,
    ) -> Result<()> {
        match code {
            0x80..=0x87 => self.set_current_window((code & 0x07) as usize),
            CLW => {
                let bitmap = packet.read_byte()?.value;
                self.clear_windows(bitmap, pts, out);
            }
            DSW => {
                let bitmap = packet.read_byte()?.value;
                self.display_windows(bitmap, pts);
            }
            HDW => {
                let bitmap = packet.read_byte()?.value;
                self.hide_windows(bitmap, pts, out);
            }
            TGW => {
                let bitmap = packet.read_byte()?.value;
                self.toggle_windows(bitmap, pts, out);
            }
            DLW => {
                let bitmap = packet.read_byte()?.value;
                self.delete_windows(bitmap, pts, out);
            }
            // Delays are not honoured; commands run as soon as they arrive.
            DLY => packet.skip(1),
            RST => {
                self.delete_windows(0xFF, pts, out);
                self.clear();
            }
            SPA => self.set_pen_attributes(packet)?,
            SPC => self.set_pen_color(packet)?,
            SPL => self.set_pen_location(packet)?,
            SWA => self.set_window_attributes(packet)?,
            0x98..=0x9F => self.define_window(packet, (code - 0x98) as usize, pts)?,
            _ => {}
        }
        Ok(())
    }

    fn set_current_window(&mut self, index: usize) {
        if self.windows[index].is_some() {
            self.current = Some(index);
        }
    }

    /// Indices of existing windows selected by a window bitmap, bit 0 first.
    fn selected(&self, bitmap: u8) -> Vec<usize> {
        (0..8)
            .filter(|&i| bitmap & (1 << i) != 0 && self.windows[i].is_some())
            .collect()
    }

    fn clear_windows(&mut self, bitmap: u8, pts: f64, out: &mut Vec<Cue>) {
        for i in self.selected(bitmap) {
            if let Some(window) = self.windows[i].as_mut() {
                out.extend(emit_if_visible(window, pts, self.number));
                window.reset_memory();
            }
        }
    }

    fn display_windows(&mut self, bitmap: u8, pts: f64) {
        for i in self.selected(bitmap) {
            if let Some(window) = self.windows[i].as_mut() {
                if !window.is_visible() {
                    window.set_start_time(pts);
                }
                window.display();
            }
        }
    }

    fn hide_windows(&mut self, bitmap: u8, pts: f64, out: &mut Vec<Cue>) {
        for i in self.selected(bitmap) {
            if let Some(window) = self.windows[i].as_mut() {
                out.extend(emit_if_visible(window, pts, self.number));
                window.hide();
            }
        }
    }

    fn toggle_windows(&mut self, bitmap: u8, pts: f64, out: &mut Vec<Cue>) {
        for i in self.selected(bitmap) {
            if let Some(window) = self.windows[i].as_mut() {
                if window.is_visible() {
                    out.extend(window.force_emit(pts, self.number));
                } else {
                    window.set_start_time(pts);
                }
                window.toggle();
            }
        }
    }

    fn delete_windows(&mut self, bitmap: u8, pts: f64, out: &mut Vec<Cue>) {
        for i in self.selected(bitmap) {
            if let Some(mut window) = self.windows[i].take() {
                out.extend(emit_if_visible(&mut window, pts, self.number));
            }
        }
    }

    /// SPA: only italics and underline from the second byte are used.
    fn set_pen_attributes(&mut self, packet: &mut DtvccPacket) -> Result<()> {
        packet.skip(1);
        let attributes = packet.read_byte()?.value;
        if let Some(window) = self.current_window() {
            window.set_pen_style(attributes & 0x80 != 0, attributes & 0x40 != 0);
        }
        Ok(())
    }

    /// SPC: foreground and background, edge color skipped.
    fn set_pen_color(&mut self, packet: &mut DtvccPacket) -> Result<()> {
        let foreground = packet.read_byte()?.value;
        let background = packet.read_byte()?.value;
        packet.skip(1);
        if let Some(window) = self.current_window() {
            window.set_pen_color(quantize_color(foreground), quantize_color(background));
        }
        Ok(())
    }

    fn set_pen_location(&mut self, packet: &mut DtvccPacket) -> Result<()> {
        let row = packet.read_byte()?.value & 0x0F;
        let col = packet.read_byte()?.value & 0x3F;
        if let Some(window) = self.current_window() {
            window.set_pen_location(usize::from(row), usize::from(col));
        }
        Ok(())
    }

    /// SWA: fill, border and effects are skipped, justification is kept.
    fn set_window_attributes(&mut self, packet: &mut DtvccPacket) -> Result<()> {
        packet.skip(2);
        let justify = packet.read_byte()?.value;
        packet.skip(1);
        if let Some(window) = self.current_window() {
            window.set_justification(Justification::from(justify));
        }
        Ok(())
    }

    /// DFx. Row and column locks are ignored. The pen is reset unless the
    /// window already existed and the pen style is 0.
    fn define_window(&mut self, packet: &mut DtvccPacket, index: usize, pts: f64) -> Result<()> {
        let existed = self.windows[index].is_some();
        let mut params = [0u8; 6];
        for param in params.iter_mut() {
            *param = packet.read_byte()?.value;
        }
        let [b1, b2, b3, b4, b5, b6] = params;

        let window = self.windows[index].get_or_insert_with(|| Window::new(pts));
        if !existed || b6 & 0x07 != 0 {
            window.reset_pen();
        }
        window.define(WindowDefinition {
            visible: b1 & 0x20 != 0,
            vertical_anchor: b2 & 0x7F,
            horizontal_anchor: b3,
            anchor_id: (b4 & 0xF0) >> 4,
            row_count: usize::from(b4 & 0x0F) + 1,
            col_count: usize::from(b5 & 0x3F) + 1,
        });
        self.current = Some(index);
        Ok(())
    }
}

fn emit_if_visible(window: &mut Window, pts: f64, service_number: u8) -> Option<Cue> {
    if window.is_visible() {
        window.force_emit(pts, service_number)
    } else {
        None
    }
}

/// Parameter bytes following an (unassigned) C2 code.
fn c2_parameter_len(code: u8) -> usize {
    match code {
        0x08..=0x0F => 1,
        0x10..=0x17 => 2,
        0x18..=0x1F => 3,
        _ => 0,
    }
}

/// Parameter bytes following an (unassigned) C3 code.
fn c3_parameter_len(code: u8) -> usize {
    match code {
        0x80..=0x87 => 4,
        0x88..=0x8F => 5,
        _ => 0,
    }
}
