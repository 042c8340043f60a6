//! Line-marker parsing for free-text copy responses.
//!
//! Recognizes lines such as `Ad Copy: ...` and `Image Prompt: ...`
//! (case-insensitive, tolerating list bullets and markdown emphasis). A value
//! continues on following lines until the next marker line.

pub const AD_COPY_MARKER: &str = "Ad Copy";
pub const IMAGE_PROMPT_MARKER: &str = "Image Prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSegment {
    /// Canonical marker name as registered with the parser.
    pub marker: String,
    pub value: String,
}

/// One variant recovered from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVariant {
    pub ad_copy: Option<String>,
    pub image_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MarkerParser {
    markers: Vec<String>,
}

impl Default for MarkerParser {
    fn default() -> Self {
        Self::new(&[AD_COPY_MARKER, IMAGE_PROMPT_MARKER])
    }
}

impl MarkerParser {
    pub fn new(markers: &[&str]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Match a marker at the start of `line`, returning the canonical marker
    /// and the remainder after the colon.
    fn match_marker<'a>(&self, line: &'a str) -> Option<(&str, &'a str)> {
        let stripped = line
            .trim_start()
            .trim_start_matches(|c: char| matches!(c, '-' | '*' | '#' | '>') || c.is_whitespace());
        let stripped = strip_ordinal(stripped);
        for marker in &self.markers {
            let Some(head) = stripped.get(..marker.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(marker) {
                continue;
            }
            let rest = stripped[marker.len()..].trim_start_matches(['*', '_', ' ']);
            if let Some(value) = rest.strip_prefix(':') {
                let value = value.trim_start_matches(['*', '_']);
                return Some((marker.as_str(), value));
            }
        }
        None
    }

    /// Every marked segment in document order. Text before the first marker
    /// is ignored.
    pub fn segments(&self, text: &str) -> Vec<MarkedSegment> {
        let mut segments: Vec<MarkedSegment> = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in text.lines() {
            if let Some((marker, value)) = self.match_marker(line) {
                if let Some((marker, lines)) = current.take() {
                    segments.push(finish_segment(marker, lines));
                }
                current = Some((marker.to_string(), vec![value.to_string()]));
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line.to_string());
            }
        }
        if let Some((marker, lines)) = current {
            segments.push(finish_segment(marker, lines));
        }
        segments
    }

    /// Value of the first segment for `marker`, if any.
    pub fn first(&self, text: &str, marker: &str) -> Option<String> {
        self.segments(text)
            .into_iter()
            .find(|segment| segment.marker.eq_ignore_ascii_case(marker))
            .map(|segment| segment.value)
    }

    /// Group segments into variants: each `Ad Copy` opens a new variant and a
    /// following `Image Prompt` attaches to it.
    pub fn variants(&self, text: &str) -> Vec<ParsedVariant> {
        let mut variants: Vec<ParsedVariant> = Vec::new();
        for segment in self.segments(text) {
            if segment.value.is_empty() {
                continue;
            }
            if segment.marker.eq_ignore_ascii_case(AD_COPY_MARKER) {
                variants.push(ParsedVariant {
                    ad_copy: Some(segment.value),
                    image_prompt: None,
                });
            } else if segment.marker.eq_ignore_ascii_case(IMAGE_PROMPT_MARKER) {
                match variants.last_mut() {
                    Some(last) if last.image_prompt.is_none() => {
                        last.image_prompt = Some(segment.value)
                    }
                    _ => variants.push(ParsedVariant {
                        ad_copy: None,
                        image_prompt: Some(segment.value),
                    }),
                }
            }
        }
        variants
    }
}

fn strip_ordinal(line: &str) -> &str {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix(['.', ')']) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

fn finish_segment(marker: String, lines: Vec<String>) -> MarkedSegment {
    let value = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.chars().all(|c| matches!(c, '-' | '*' | '=')))
        .collect::<Vec<_>>()
        .join("\n");
    MarkedSegment { marker, value }
}
