use super::data::Text;

/// What a [`TextCursor`] yields on each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorStep {
    Char(char),
    /// The cursor crossed into the next paragraph.
    EndParagraph,
    /// The last paragraph is exhausted; the cursor is back at the start.
    EndText,
}

/// Position inside a [`Text`] as `(paragraph, char index)`.
///
/// Cursors borrow the text and never touch each other, so several passes can
/// walk the same text independently.
#[derive(Clone, Copy, Debug)]
pub struct TextCursor<'a> {
    text: &'a Text,
    paragraph: usize,
    index: usize,
}

impl<'a> TextCursor<'a> {
    /// Cursor at the start of `text`.
    pub fn new(text: &'a Text) -> Self {
        Self {
            text,
            paragraph: 0,
            index: 0,
        }
    }

    /// The text this cursor walks.
    pub fn text(&self) -> &'a Text {
        self.text
    }

    /// Current `(paragraph, char index)`.
    pub fn position(&self) -> (usize, usize) {
        (self.paragraph, self.index)
    }

    fn paragraph_len(&self, paragraph: usize) -> usize {
        self.text.paragraph(paragraph).map_or(0, <[char]>::len)
    }

    /// Moves one character forward, crossing into the next paragraph or
    /// wrapping to the start once the text is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> CursorStep {
        let Some(par) = self.text.paragraph(self.paragraph) else {
            self.paragraph = 0;
            self.index = 0;
            return CursorStep::EndText;
        };

        if let Some(&ch) = par.get(self.index) {
            self.index += 1;
            return CursorStep::Char(ch);
        }

        self.paragraph += 1;
        self.index = 0;
        if self.paragraph >= self.text.paragraph_count() {
            // left at the start so the text can be drawn again from scratch
            self.paragraph = 0;
            return CursorStep::EndText;
        }
        CursorStep::EndParagraph
    }

    /// Undoes one [`next`](Self::next). A no-op at the very start.
    pub fn rewind(&mut self) -> &mut Self {
        if self.index > 0 {
            self.index -= 1;
        } else if self.paragraph > 0 {
            self.paragraph -= 1;
            self.index = self.paragraph_len(self.paragraph);
        }
        self
    }
}

impl PartialEq for TextCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.text, other.text) && self.position() == other.position()
    }
}
