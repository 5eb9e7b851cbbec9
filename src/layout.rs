//! Layout rules for the flight card, the loading screen, and messages.
//!
//! These are pure functions of the panel size and the text, so they can be
//! tested without a surface.
//!
//! Card layout on the stock 160×32 panel:
//!
//! ```text
//! ┌──────────────────────────────┐  y = 0   border
//! │  United Airlines             │  y = 3   airline
//! │  KSFO>KJFK                   │  y = 12  route
//! │  Boeing 737-800              │  y = 21  aircraft
//! │                              │
//! └──────────────────────────────┘  y = 31
//! ```

use crate::flight::FlightInfo;

/// Horizontal advance of one glyph cell (5 px glyph + 1 px spacing).
pub const GLYPH_WIDTH: i32 = 6;
/// Glyph cell height for card and loading text (7 px glyph + 1 px spacing).
pub const GLYPH_HEIGHT: i32 = 8;
/// Glyph cell height assumed when centering single-line messages.
pub const MESSAGE_GLYPH_HEIGHT: i32 = 6;
pub const BORDER: i32 = 1;
/// Gap between the border and the card text, on every side.
pub const PADDING: i32 = 2;
pub const LINE_SPACING: i32 = 1;
pub const CARD_LINES: usize = 3;
pub const LOADING_TEXT: &str = "...";

const ELLIPSIS: &str = "...";

/// Fit `text` into `max_columns` characters.
///
/// Text that fits is returned unchanged. Otherwise it is cut to leave room
/// for a trailing `"..."`, unless there are 3 columns or fewer, in which case
/// it is cut hard.
pub fn truncate_to_columns(text: &str, max_columns: usize) -> String {
    if text.chars().count() <= max_columns {
        return text.to_string();
    }
    if max_columns <= ELLIPSIS.len() {
        return text.chars().take(max_columns).collect();
    }
    let mut cut: String = text.chars().take(max_columns - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Columns of glyphs that fit in `width` pixels; never negative.
fn columns_in(width: i32) -> usize {
    (width / GLYPH_WIDTH).max(0) as usize
}

/// Where the card's text goes on a panel of a given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub inner_width: i32,
    pub inner_height: i32,
    pub max_columns: usize,
    pub start_x: i32,
    /// Top edge of each of the three text lines.
    pub line_y: [i32; CARD_LINES],
}

impl CardLayout {
    pub fn new(width: u32, height: u32) -> Self {
        let inner_width = width as i32 - 2 * BORDER - 2 * PADDING;
        let inner_height = height as i32 - 2 * BORDER - 2 * PADDING;
        let lines = CARD_LINES as i32;
        let total_text_height = lines * GLYPH_HEIGHT + (lines - 1) * LINE_SPACING;
        // Integer division rounds the block toward the top on odd remainders.
        let top = BORDER + PADDING + (inner_height - total_text_height) / 2;
        let step = GLYPH_HEIGHT + LINE_SPACING;

        Self {
            inner_width,
            inner_height,
            max_columns: columns_in(inner_width),
            start_x: BORDER + PADDING,
            line_y: [top, top + step, top + 2 * step],
        }
    }
}

/// The three card lines for `flight`, each already truncated to
/// `max_columns`: airline, route, aircraft. Unknown values give empty lines.
pub fn card_lines(flight: &FlightInfo, max_columns: usize) -> [String; CARD_LINES] {
    [
        truncate_to_columns(flight.airline_name(), max_columns),
        truncate_to_columns(&flight.route(), max_columns),
        truncate_to_columns(flight.aircraft_type(), max_columns),
    ]
}

/// Top-left of the loading text: centered horizontally, 2 px above center.
pub fn loading_origin(width: u32, height: u32) -> (i32, i32) {
    let text_width = LOADING_TEXT.len() as i32 * GLYPH_WIDTH;
    let x = (width as i32 - text_width) / 2;
    let y = (height as i32 - GLYPH_HEIGHT) / 2 - 2;
    (x, y)
}

/// Position and fitted text of a single-line message: left edge, vertically
/// centered, truncated to the panel width.
pub fn message_line(width: u32, height: u32, text: &str) -> (i32, i32, String) {
    let line = truncate_to_columns(text, columns_in(width as i32));
    let y = (height as i32 - MESSAGE_GLYPH_HEIGHT) / 2;
    (0, y, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::Airport;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("KSFO>KJFK", 25, "KSFO>KJFK")]
    #[case("ABCDE", 5, "ABCDE")]
    #[case("ABCDEF", 5, "AB...")]
    #[case("ABCDEFG", 4, "A...")]
    #[case("ABCDEFG", 3, "ABC")]
    #[case("ABCDEFG", 1, "A")]
    #[case("ABCDEFG", 0, "")]
    #[case("", 0, "")]
    fn test_truncate_to_columns(#[case] text: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate_to_columns(text, max), expected);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_to_columns("Zürich–Genève", 8), "Züric...");
        assert_eq!(truncate_to_columns("ÄÖÜ", 3), "ÄÖÜ");
    }

    #[test]
    fn truncated_lines_are_exactly_max_columns() {
        let long = "X".repeat(40);
        for max in 4..40 {
            assert_eq!(truncate_to_columns(&long, max).chars().count(), max);
        }
    }

    #[test]
    fn card_layout_on_stock_panel() {
        let layout = CardLayout::new(160, 32);
        assert_eq!(
            layout,
            CardLayout {
                inner_width: 154,
                inner_height: 26,
                max_columns: 25,
                start_x: 3,
                line_y: [3, 12, 21],
            }
        );
    }

    #[rstest]
    #[case(32, [3, 12, 21])]
    #[case(33, [3, 12, 21])]
    #[case(34, [4, 13, 22])]
    #[case(64, [19, 28, 37])]
    fn card_text_block_is_centered(#[case] height: u32, #[case] expected: [i32; 3]) {
        assert_eq!(CardLayout::new(160, height).line_y, expected);
    }

    #[rstest]
    #[case(64, 32, 9)]
    #[case(64, 64, 9)]
    #[case(32, 16, 4)]
    #[case(8, 8, 0)]
    #[case(2, 2, 0)]
    fn card_columns(#[case] width: u32, #[case] height: u32, #[case] expected: usize) {
        assert_eq!(CardLayout::new(width, height).max_columns, expected);
    }

    #[test]
    fn card_lines_use_fallbacks_and_truncate() {
        let flight = FlightInfo {
            airline_display_name_full: "A".repeat(40),
            aircraft_code: "B738".into(),
            origin: Airport {
                code_icao: "KSFO".into(),
            },
            ..FlightInfo::default()
        };
        let [airline, route, aircraft] = card_lines(&flight, 25);
        assert_eq!(airline, format!("{}...", "A".repeat(22)));
        assert_eq!(route, "KSFO>");
        assert_eq!(aircraft, "B738");
    }

    #[test]
    fn card_lines_of_empty_flight() {
        assert_eq!(
            card_lines(&FlightInfo::default(), 25),
            [String::new(), ">".to_string(), String::new()]
        );
    }

    #[rstest]
    #[case(160, 32, 71, 10)]
    #[case(64, 32, 23, 10)]
    #[case(32, 16, 7, 2)]
    fn loading_text_position(#[case] w: u32, #[case] h: u32, #[case] x: i32, #[case] y: i32) {
        assert_eq!(loading_origin(w, h), (x, y));
    }

    #[test]
    fn message_is_left_aligned_and_centered() {
        assert_eq!(message_line(160, 32, "No flights"), (0, 13, "No flights".to_string()));
    }

    #[test]
    fn message_truncates_to_full_width() {
        let (_, _, line) = message_line(64, 32, "Connecting to WiFi network");
        assert_eq!(line, "Connect...");
    }
}
