//! Diagram vs. decoration classification for SVG fragments.
//!
//! Icons are small and shallow; process diagrams are either physically large
//! or richly nested. Anything that does not parse as a single `<svg>` root is
//! treated as noise.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::{Artifact, ExtractionMode};

/// Width or height above which a fragment counts as a diagram
pub const MIN_DIAGRAM_DIMENSION: i64 = 300;

/// Descendant count above which a fragment counts as a diagram
pub const MIN_DIAGRAM_ELEMENTS: usize = 20;

/// Serialized size the largest fragment must exceed in largest-fragment mode
pub const MIN_LARGEST_FRAGMENT_CHARS: usize = 1000;

/// Measurements taken from a parsed fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgShape {
    pub width: i64,
    pub height: i64,

    /// Elements below the root, at any depth
    pub element_count: usize,
}

impl SvgShape {
    /// Whether these measurements describe a diagram
    pub fn is_diagram(&self) -> bool {
        self.width > MIN_DIAGRAM_DIMENSION
            || self.height > MIN_DIAGRAM_DIMENSION
            || self.element_count > MIN_DIAGRAM_ELEMENTS
    }
}

/// Classify one fragment; `true` means keep it
pub fn classify(markup: &str) -> bool {
    measure(markup).map(|shape| shape.is_diagram()).unwrap_or(false)
}

/// Parse a fragment and measure it, or `None` if it is not a well-formed
/// document with a single `<svg>` root.
pub fn measure(markup: &str) -> Option<SvgShape> {
    let mut reader = Reader::from_str(markup);

    let mut shape: Option<SvgShape> = None;
    let mut depth = 0usize;
    let mut closed = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if closed {
                    return None;
                }
                if depth == 0 {
                    shape = Some(root_shape(&e)?);
                } else if let Some(ref mut s) = shape {
                    s.element_count += 1;
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if closed {
                    return None;
                }
                if depth == 0 {
                    shape = Some(root_shape(&e)?);
                    closed = true;
                } else if let Some(ref mut s) = shape {
                    s.element_count += 1;
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    closed = true;
                }
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if closed {
        shape
    } else {
        None
    }
}

fn root_shape(root: &BytesStart<'_>) -> Option<SvgShape> {
    if !root.local_name().as_ref().eq_ignore_ascii_case(b"svg") {
        return None;
    }

    let mut width = 0;
    let mut height = 0;
    for attr in root.attributes() {
        let attr = attr.ok()?;
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"width" => width = parse_dimension(&value),
            b"height" => height = parse_dimension(&value),
            _ => {}
        }
    }

    Some(SvgShape {
        width,
        height,
        element_count: 0,
    })
}

/// Coerce an SVG length to whole units, dropping an absolute unit suffix.
/// Percentages and anything unparsable count as 0.
pub fn parse_dimension(value: &str) -> i64 {
    const UNITS: [&str; 8] = ["px", "pt", "pc", "mm", "cm", "in", "em", "ex"];

    let value = value.trim();
    let number = UNITS
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .unwrap_or(value)
        .trim();

    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i64)
        .unwrap_or(0)
}

/// Turn the fragments found on one page into artifacts.
///
/// Structural mode classifies every fragment on its own. Largest mode keeps
/// only the fragment with the longest markup, wanted only past
/// [`MIN_LARGEST_FRAGMENT_CHARS`].
pub fn extract_artifacts(fragments: Vec<String>, mode: ExtractionMode) -> Vec<Artifact> {
    match mode {
        ExtractionMode::Structural => fragments
            .into_iter()
            .map(|markup| {
                let wanted = classify(&markup);
                Artifact::new(markup, wanted)
            })
            .collect(),
        ExtractionMode::Largest => {
            let mut largest: Option<(usize, String)> = None;
            for markup in fragments {
                let size = markup.chars().count();
                // Ties keep the first fragment in document order.
                if largest.as_ref().map_or(true, |(best, _)| size > *best) {
                    largest = Some((size, markup));
                }
            }
            largest
                .map(|(size, markup)| vec![Artifact::new(markup, size > MIN_LARGEST_FRAGMENT_CHARS)])
                .unwrap_or_default()
        }
    }
}
