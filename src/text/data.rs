use std::sync::Arc;

use crate::font::FontHandle;

use super::cursor::TextCursor;

/// Source string split into paragraphs, paired with the font that lays it out.
///
/// The split happens once, on `'\n'`. Without a font every layout operation
/// is a no-op that yields empty output.
#[derive(Clone)]
pub struct Text {
    source: String,
    paragraphs: Vec<Vec<char>>,
    font: Option<Arc<dyn FontHandle>>,
}

impl Text {
    /// Splits `source` into paragraphs laid out with `font`.
    pub fn new(source: impl Into<String>, font: Option<Arc<dyn FontHandle>>) -> Self {
        let source = source.into();
        let paragraphs = source.split('\n').map(|p| p.chars().collect()).collect();
        Self {
            source,
            paragraphs,
            font,
        }
    }

    /// The unsplit source string.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Font the text is laid out with.
    pub fn font(&self) -> Option<&Arc<dyn FontHandle>> {
        self.font.as_ref()
    }

    /// Number of `'\n'`-separated paragraphs, at least one.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub(crate) fn paragraph(&self, index: usize) -> Option<&[char]> {
        self.paragraphs.get(index).map(Vec::as_slice)
    }

    /// Fresh cursor at the start of the text.
    pub fn cursor(&self) -> TextCursor<'_> {
        TextCursor::new(self)
    }

    /// Width of the whole text laid out on one infinite line.
    ///
    /// Paragraph breaks contribute nothing.
    pub fn flat_length(&self, font_size: f64) -> f64 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        let scale = font_size / font.units_per_em();
        self.paragraphs
            .iter()
            .map(|p| {
                let s: String = p.iter().collect();
                font.glyphs_for(&s)
                    .iter()
                    .map(|g| g.advance_width * scale)
                    .sum::<f64>()
            })
            .sum()
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("source", &self.source)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::SquareFont;

    #[test]
    fn paragraphs_split_on_newlines() {
        let text = Text::new("ab\n\nc", None);
        assert_eq!(text.paragraph_count(), 3);
        assert_eq!(text.paragraph(1), Some(&[][..]));
        assert_eq!(text.as_str(), "ab\n\nc");
    }

    #[test]
    fn flat_length_ignores_breaks() {
        let text = Text::new("ab\nc", Some(SquareFont::new(1000.0, 500.0)));
        assert!((text.flat_length(10.0) - 15.0).abs() < 1e-9);
        assert_eq!(Text::new("abc", None).flat_length(10.0), 0.0);
    }
}
