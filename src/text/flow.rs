//! Glyph placement along a list of segments.
//!
//! The flow is a small state machine: a [`TextCursor`] hands out characters,
//! and a live channel `(segment, current, end)` receives them until a glyph
//! run no longer fits, at which point the character is handed back and the
//! channel moves to the next segment.

use crate::font::PathCommand;
use crate::geometry::{Point, Segment, advance_toward};

use super::cursor::{CursorStep, TextCursor};
use super::data::Text;

/// One glyph placed in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphPlacement {
    /// Outline already scaled and moved to `position`.
    pub outline: Vec<PathCommand>,
    /// Channel the glyph was placed on (after merging, if any).
    pub segment: Segment,
    pub position: Point,
    pub next_position: Point,
}

struct Channel {
    index: usize,
    segment: Segment,
    current: Point,
}

impl Channel {
    fn open(index: usize, segment: Segment) -> Self {
        Self {
            index,
            segment,
            current: segment.start,
        }
    }

    fn remaining(&self) -> f64 {
        (self.segment.end - self.current).length()
    }
}

impl Text {
    /// Flows the text from `cursor` along `segments`.
    ///
    /// Returns `None` as the cursor once the whole text is placed, or the
    /// cursor to resume from when the segments ran out first. With
    /// `merge_adjacent`, an overflow carries the leftover position over as
    /// the start of the next segment so consecutive segments form one
    /// channel.
    pub fn draw<'a>(
        &'a self,
        font_size: f64,
        segments: &[Segment],
        mut cursor: TextCursor<'a>,
        merge_adjacent: bool,
    ) -> (Option<TextCursor<'a>>, Vec<GlyphPlacement>) {
        let Some(font) = self.font() else {
            return (None, Vec::new());
        };
        let Some(&first) = segments.first() else {
            return (Some(cursor), Vec::new());
        };

        let scale = font_size / font.units_per_em();
        let mut channel = Channel::open(0, first);
        let mut placements = Vec::new();

        loop {
            let ch = match cursor.next() {
                CursorStep::EndText => return (None, placements),
                CursorStep::EndParagraph => {
                    // a paragraph always starts on a fresh segment
                    let Some(&next) = segments.get(channel.index + 1) else {
                        return (Some(cursor), placements);
                    };
                    channel = Channel::open(channel.index + 1, next);
                    continue;
                }
                CursorStep::Char(ch) => ch,
            };

            let mut buf = [0u8; 4];
            let glyphs = font.glyphs_for(ch.encode_utf8(&mut buf));
            let advance: f64 = glyphs.iter().map(|g| g.advance_width * scale).sum();

            if advance < channel.remaining() {
                for glyph in glyphs {
                    let position = channel.current;
                    let next_position = advance_toward(
                        position,
                        channel.segment.end,
                        glyph.advance_width * scale,
                    );
                    let outline = glyph
                        .outline
                        .iter()
                        .map(|cmd| {
                            cmd.map(|p| Point::new(position.x + p.x * scale, position.y + p.y * scale))
                        })
                        .collect();
                    placements.push(GlyphPlacement {
                        outline,
                        segment: channel.segment,
                        position,
                        next_position,
                    });
                    channel.current = next_position;
                }
                continue;
            }

            // hand the character back and try it on the next segment
            cursor.rewind();
            let Some(&next) = segments.get(channel.index + 1) else {
                return (Some(cursor), placements);
            };
            let next = if merge_adjacent {
                Segment::new(channel.current, next.end)
            } else {
                next
            };
            channel = Channel::open(channel.index + 1, next);
        }
    }
}
