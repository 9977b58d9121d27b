//! Text classification for OCR detections
//!
//! Cleans recognized strings and sorts them into numerals (stat values),
//! names (player names), ambiguous tokens that could be either, and noise.
//! Each kind gets the anchor point matching how the scoreboard renders it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Point};

/// Up to four digits; `O`/`o` are accepted because scoreboard fonts make OCR
/// read zero as the letter O.
const NUMERAL_PATTERN: &str = r"^[\dOo]{0,4}$";

/// 3-15 characters of letters, digits, `_`, `.` or `-`, not starting with a
/// digit or one of the punctuation characters.
const NAME_PATTERN: &str = r"^[\p{Alphabetic}\p{N}--\p{Nd}][\p{Alphabetic}\p{N}_.\-]{2,14}$";

/// More spaces than this means the text is real multi-word content
const MAX_SPURIOUS_SPACES: usize = 2;

/// Semantic kind of a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    /// Stat value (score, kills, ping...)
    Numeral,
    /// Player name
    Name,
    /// Matches both patterns, e.g. "OO0"
    Mixed,
    /// Matches neither pattern
    Neither,
}

impl TextKind {
    fn from_matches(numeral: bool, name: bool) -> Self {
        match (numeral, name) {
            (true, true) => TextKind::Mixed,
            (true, false) => TextKind::Numeral,
            (false, true) => TextKind::Name,
            (false, false) => TextKind::Neither,
        }
    }
}

/// One OCR detection after cleaning and classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    /// Position of the detection in the provider's output
    pub index: usize,
    /// Text exactly as recognized
    pub raw_text: String,
    /// Cleaned text
    pub text: String,
    pub bounding_box: BoundingBox,
    pub kind: TextKind,
    /// Representative point used for all spatial grouping
    pub anchor: Point,
}

/// Remove OCR noise from a recognized string.
///
/// All `?` are dropped. If at most two spaces remain they are dropped too,
/// since OCR likes to split a single token; three or more spaces are kept as
/// genuine multi-word text.
pub fn clean_text(raw: &str) -> String {
    let text: String = raw.chars().filter(|&c| c != '?').collect();
    if text.matches(' ').count() <= MAX_SPURIOUS_SPACES {
        text.chars().filter(|&c| c != ' ').collect()
    } else {
        text
    }
}

/// Anchor for a kind: numerals are centered in their column, everything else
/// is left-aligned.
pub fn anchor_for(kind: TextKind, bbox: &BoundingBox) -> Point {
    match kind {
        TextKind::Numeral => bbox.center_mid(),
        TextKind::Name | TextKind::Mixed | TextKind::Neither => bbox.left_mid(),
    }
}

/// Compiled classification patterns
#[derive(Debug, Clone)]
pub struct TextClassifier {
    numeral: Regex,
    name: Regex,
}

impl TextClassifier {
    /// Compile the numeral and name patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            numeral: Regex::new(NUMERAL_PATTERN)?,
            name: Regex::new(NAME_PATTERN)?,
        })
    }

    /// Classify already-cleaned text
    pub fn kind_of(&self, text: &str) -> TextKind {
        TextKind::from_matches(self.numeral.is_match(text), self.name.is_match(text))
    }

    /// Clean, classify and anchor one detection
    pub fn classify(&self, index: usize, raw_text: &str, bounding_box: BoundingBox) -> TextItem {
        let text = clean_text(raw_text);
        let kind = self.kind_of(&text);
        let anchor = anchor_for(kind, &bounding_box);

        TextItem {
            index,
            raw_text: raw_text.to_string(),
            text,
            bounding_box,
            kind,
            anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TextClassifier {
        TextClassifier::new().unwrap()
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::from_coords(&[x, y, x + w, y, x + w, y + h, x, y + h]).unwrap()
    }

    #[test]
    fn test_clean_text_spaces() {
        assert_eq!(clean_text("Play er"), "Player");
        assert_eq!(clean_text("P lay er"), "Player");
        assert_eq!(clean_text("a b c d"), "a b c d");
    }

    #[test]
    fn test_clean_text_question_marks() {
        assert_eq!(clean_text("1?2?"), "12");
        assert_eq!(clean_text("???"), "");
        // '?' is removed before spaces are counted
        assert_eq!(clean_text("a ? b ? c"), "a  b  c");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let samples = [
            "", " ", "Play er", "a b c d", "1?2?", "? ? ?", "x  y", "  lead trail  ",
            "Ninja_42", "a ? b ? c", "O O",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_numerals() {
        let c = classifier();
        assert_eq!(c.kind_of("12"), TextKind::Numeral);
        assert_eq!(c.kind_of("1O0"), TextKind::Numeral);
        assert_eq!(c.kind_of("9999"), TextKind::Numeral);
        assert_eq!(c.kind_of(""), TextKind::Numeral);
        assert_eq!(c.kind_of("12345"), TextKind::Neither);
    }

    #[test]
    fn test_names() {
        let c = classifier();
        assert_eq!(c.kind_of("Player"), TextKind::Name);
        assert_eq!(c.kind_of("Ninja_42"), TextKind::Name);
        assert_eq!(c.kind_of("a.b-c"), TextKind::Name);
        assert_eq!(c.kind_of("Ab"), TextKind::Neither);
        assert_eq!(c.kind_of("ABCDEFGHIJKLMNOP"), TextKind::Neither);
        assert_eq!(c.kind_of("ABCDEFGHIJKLMNO"), TextKind::Name);
        assert_eq!(c.kind_of("_under"), TextKind::Neither);
        assert_eq!(c.kind_of(".dot"), TextKind::Neither);
        assert_eq!(c.kind_of("-dash"), TextKind::Neither);
        assert_eq!(c.kind_of("1player"), TextKind::Neither);
        assert_eq!(c.kind_of("bad name here now"), TextKind::Neither);
        assert_eq!(c.kind_of("semi;colon"), TextKind::Neither);
    }

    #[test]
    fn test_mixed() {
        let c = classifier();
        assert_eq!(c.kind_of("OO0"), TextKind::Mixed);
        assert_eq!(c.kind_of("ooo"), TextKind::Mixed);
        assert_eq!(c.kind_of("O100"), TextKind::Mixed);
    }

    #[test]
    fn test_classify_question_mark_numeral() {
        let item = classifier().classify(0, "1?2?", rect(0.0, 0.0, 20.0, 10.0));
        assert_eq!(item.text, "12");
        assert_eq!(item.raw_text, "1?2?");
        assert_eq!(item.kind, TextKind::Numeral);
    }

    #[test]
    fn test_anchor_by_kind() {
        let c = classifier();
        let bbox = rect(100.0, 50.0, 40.0, 10.0);

        let numeral = c.classify(0, "42", bbox);
        assert_eq!(numeral.anchor, Point::new(120.0, 55.0));

        let name = c.classify(1, "Player", bbox);
        assert_eq!(name.anchor, Point::new(100.0, 55.0));

        let mixed = c.classify(2, "OO0", bbox);
        assert_eq!(mixed.anchor, Point::new(100.0, 55.0));

        let neither = c.classify(3, "!!", bbox);
        assert_eq!(neither.kind, TextKind::Neither);
        assert_eq!(neither.anchor, Point::new(100.0, 55.0));
    }
}
