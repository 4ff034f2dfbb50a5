//! Turns a grid of styled characters into a [`Cue`].

use mediacheck_common::{build_raw_text, Color, Cue, Style, Text};

/// Default pen foreground.
pub const DEFAULT_TEXT_COLOR: Color = Color::White;
/// Default pen background.
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::Black;

/// One character cell with the pen attributes it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledChar {
    /// Usually one glyph; a few mapped codes expand to several.
    pub character: String,
    pub underline: bool,
    pub italics: bool,
    pub text_color: Color,
    pub background_color: Color,
}

impl StyledChar {
    fn is_blank(&self) -> bool {
        self.character.trim().is_empty()
    }

    fn attributes(&self) -> (bool, bool, Color, Color) {
        (
            self.underline,
            self.italics,
            self.text_color,
            self.background_color,
        )
    }
}

fn has_content(cell: &Option<StyledChar>) -> bool {
    cell.as_ref().is_some_and(|c| !c.is_blank())
}

fn styled_text(attributes: (bool, bool, Color, Color)) -> Text {
    let (underline, italics, text_color, background_color) = attributes;
    Text {
        text: String::new(),
        style: Some(Style {
            background_color: Some(background_color.to_string()),
            color: Some(text_color.to_string()),
            text_decoration: underline.then(|| "underline".to_string()),
            font_style: italics.then(|| "italic".to_string()),
        }),
    }
}

/// Fill `cue` from `rows`, or return `None` when nothing should be emitted.
///
/// Only the span of rows holding a visible character is scanned, and within
/// each row only the span between its first and last visible character. A
/// new text run starts whenever any pen attribute changes; the style carries
/// over from one row to the next. Empty cells inside the span read as
/// spaces.
pub fn assemble<R: AsRef<[Option<StyledChar>]>>(mut cue: Cue, rows: &[R]) -> Option<Cue> {
    if cue.begin >= cue.end {
        return None;
    }

    let first_row = rows.iter().position(|r| r.as_ref().iter().any(has_content))?;
    let last_row = rows.iter().rposition(|r| r.as_ref().iter().any(has_content))?;

    let mut current = (false, false, DEFAULT_TEXT_COLOR, DEFAULT_BACKGROUND_COLOR);
    for row in &rows[first_row..=last_row] {
        let row = row.as_ref();
        let (Some(first_col), Some(last_col)) = (
            row.iter().position(has_content),
            row.iter().rposition(has_content),
        ) else {
            continue;
        };

        let mut text = styled_text(current);
        for cell in &row[first_col..=last_col] {
            let Some(styled) = cell else {
                text.text.push(' ');
                continue;
            };
            if styled.attributes() != current {
                if !text.text.is_empty() {
                    cue.texts.push(text);
                }
                current = styled.attributes();
                text = styled_text(current);
            }
            text.text.push_str(&styled.character);
        }
        if !text.text.is_empty() {
            cue.texts.push(text);
        }
    }

    if cue.texts.is_empty() {
        return None;
    }
    cue.raw_text = build_raw_text(&cue.texts);
    Some(cue)
}
