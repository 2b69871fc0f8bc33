use crate::{
    EVENT_TYPE_COUNT, EventType,
    overlay::catalog::{Keyword, KeywordContext, MAX_KEYWORD_STRING_SIZE, Metric},
};

/// Maximum number of live metrics per event type.
pub const MAX_METRICS_PER_TYPE: usize = 16;

/// Upper bound of an explicit placeholder width.
pub const MAX_METRIC_WIDTH: usize = 32;

/// Size of the parsed text buffer, terminator included.
pub const MAX_PARSED_TEXT_SIZE: usize = 1024;

/// A fixed region of the parsed text bound to a live metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSlot {
    pub metric: Metric,
    /// Byte offset of the region in the parsed text.
    pub offset: u16,
    pub width: u8,
}

impl MetricSlot {
    const EMPTY: MetricSlot = MetricSlot {
        metric: Metric::CpuUsage,
        offset: 0,
        width: 0,
    };
}

/// Result of parsing an overlay template: the text to display with every
/// keyword substituted, and the slots where live metrics are written.
///
/// Parsing never fails. Unknown placeholders, placeholders of a full event
/// type and placeholders that don't fit in the text buffer are kept as
/// literal text.
///
/// Template syntax:
///
/// | Input | Output |
/// |-------|--------|
/// | `%%` | `%` |
/// | `%cpuModel` | keyword string, resolved once |
/// | `%frameNumber` | metric with its default width |
/// | `%5frameNumber` | metric with an explicit width in `[1, 32]` |
/// | `\n`, `\r` | line break |
pub struct ParsedTemplate {
    text: [u8; MAX_PARSED_TEXT_SIZE],
    len: usize,
    slots: [[MetricSlot; MAX_METRICS_PER_TYPE]; EVENT_TYPE_COUNT],
    slot_counts: [usize; EVENT_TYPE_COUNT],
}

impl ParsedTemplate {
    pub fn new() -> Self {
        Self {
            text: [0; MAX_PARSED_TEXT_SIZE],
            len: 0,
            slots: [[MetricSlot::EMPTY; MAX_METRICS_PER_TYPE]; EVENT_TYPE_COUNT],
            slot_counts: [0; EVENT_TYPE_COUNT],
        }
    }

    /// Parses `template`, replacing the previous content.
    pub fn parse(&mut self, template: &[u8], keywords: &KeywordContext<'_>) {
        const LIMIT: usize = MAX_PARSED_TEXT_SIZE - 1;

        self.len = 0;
        self.slot_counts = [0; EVENT_TYPE_COUNT];
        let mut keyword_buffer = [0u8; MAX_KEYWORD_STRING_SIZE];
        let mut i = 0;

        while i < template.len() && self.len < LIMIT {
            let character = template[i];
            if character != b'%' {
                self.push(character);
                i += 1;
                continue;
            }

            let rest = &template[i + 1..];
            if rest.first() == Some(&b'%') {
                self.push(b'%');
                i += 2;
                continue;
            }

            if let Some(keyword) = Keyword::longest_match(rest) {
                let size = keywords.resolve(keyword, &mut keyword_buffer);
                if self.len + size <= LIMIT {
                    self.text[self.len..self.len + size].copy_from_slice(&keyword_buffer[..size]);
                    self.len += size;
                    i += 1 + keyword.name().len();
                    continue;
                }
            } else {
                let (width, digits) = parse_width(rest);
                let counts = self.slot_counts;
                let metric = Metric::longest_match(&rest[digits..], |m| {
                    counts[m.event_type().index()] < MAX_METRICS_PER_TYPE
                });
                if let Some(metric) = metric {
                    let width = width.unwrap_or(metric.default_width() as usize);
                    if self.len + width <= LIMIT {
                        self.add_slot(metric, width);
                        i += 1 + digits + metric.name().len();
                        continue;
                    }
                }
            }

            self.push(b'%');
            i += 1;
        }

        self.text[self.len] = 0;
    }

    /// The parsed text, terminator excluded.
    pub fn text(&self) -> &[u8] {
        &self.text[..self.len]
    }

    pub fn slots(&self, event_type: EventType) -> &[MetricSlot] {
        let index = event_type.index();
        &self.slots[index][..self.slot_counts[index]]
    }

    fn push(&mut self, byte: u8) {
        self.text[self.len] = byte;
        self.len += 1;
    }

    fn add_slot(&mut self, metric: Metric, width: usize) {
        let index = metric.event_type().index();
        self.slots[index][self.slot_counts[index]] = MetricSlot {
            metric,
            offset: self.len as u16,
            width: width as u8,
        };
        self.slot_counts[index] += 1;
        self.text[self.len..self.len + width].fill(b' ');
        self.len += width;
    }
}

impl Default for ParsedTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParsedTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedTemplate")
            .field("text", &String::from_utf8_lossy(self.text()))
            .field("slot_counts", &self.slot_counts)
            .finish()
    }
}

/// Reads up to two leading decimal digits. Returns the width clamped to
/// `[1, MAX_METRIC_WIDTH]` and the number of digits consumed.
fn parse_width(text: &[u8]) -> (Option<usize>, usize) {
    let digits = text
        .iter()
        .take(2)
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 {
        return (None, 0);
    }
    let width = text[..digits]
        .iter()
        .fold(0usize, |acc, c| acc * 10 + usize::from(c - b'0'));
    (Some(width.clamp(1, MAX_METRIC_WIDTH)), digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{GraphicsInfo, HostInfo};

    fn parse(template: &str) -> ParsedTemplate {
        let host = HostInfo {
            engine_version: "Engine 2.0".into(),
            platform_name: "headless".into(),
        };
        let graphics = GraphicsInfo {
            desktop_gl: false,
            version: "ES 3.2".into(),
            vendor: "Acme".into(),
            renderer: "Soft".into(),
        };
        let mut parsed = ParsedTemplate::new();
        parsed.parse(
            template.as_bytes(),
            &KeywordContext {
                host: &host,
                graphics: &graphics,
            },
        );
        parsed
    }

    fn text(parsed: &ParsedTemplate) -> String {
        String::from_utf8(parsed.text().to_vec()).unwrap()
    }

    #[test]
    fn literal_text_is_copied() {
        let parsed = parse("hello\nworld\r!");
        assert_eq!(text(&parsed), "hello\nworld\r!");
        for event_type in EventType::ALL {
            assert!(parsed.slots(event_type).is_empty());
        }
    }

    #[test]
    fn escaped_percent_is_not_a_placeholder() {
        let parsed = parse("%%cpuUsage");
        assert_eq!(text(&parsed), "%cpuUsage");
        assert!(parsed.slots(EventType::Process).is_empty());
    }

    #[test]
    fn keywords_are_substituted() {
        let parsed = parse("%engineVersion on %platformName, %glVersion, %gpuModel");
        assert_eq!(text(&parsed), "Engine 2.0 on headless, ES 3.2, Acme Soft");
    }

    #[test]
    fn metric_with_explicit_width() {
        let parsed = parse("F:%5frameNumber");
        assert_eq!(text(&parsed), "F:     ");
        assert_eq!(
            parsed.slots(EventType::Frame),
            &[MetricSlot {
                metric: Metric::FrameNumber,
                offset: 2,
                width: 5
            }]
        );
    }

    #[test]
    fn metric_with_default_width() {
        let parsed = parse("%rssMemory kB");
        assert_eq!(parsed.slots(EventType::Process)[0].width, 8);
        assert_eq!(text(&parsed), "         kB");
    }

    #[test]
    fn width_is_clamped() {
        let parsed = parse("%99deltaTime|%0syncTime");
        let slots = parsed.slots(EventType::Frame);
        assert_eq!(slots[0].width as usize, MAX_METRIC_WIDTH);
        assert_eq!(slots[1].width, 1);
    }

    #[test]
    fn only_two_width_digits_are_read() {
        let parsed = parse("%123frameNumber");
        assert!(parsed.slots(EventType::Frame).is_empty());
        assert_eq!(text(&parsed), "%123frameNumber");
    }

    #[test]
    fn unknown_placeholders_stay_literal() {
        // The `%` is kept too, so a mistyped name shows up as typed.
        let parsed = parse("%bogus %7 %");
        assert_eq!(text(&parsed), "%bogus %7 %");
    }

    #[test]
    fn slots_are_grouped_by_event_type() {
        let parsed = parse("%cpuUsage %windowId %gpuTime %threadCount");
        assert_eq!(parsed.slots(EventType::Process).len(), 2);
        assert_eq!(parsed.slots(EventType::Window).len(), 1);
        assert_eq!(parsed.slots(EventType::Frame).len(), 1);
        assert!(parsed.slots(EventType::Generic).is_empty());
    }

    #[test]
    fn seventeenth_slot_of_a_type_is_literal() {
        let template = "%1frameNumber".repeat(17);
        let parsed = parse(&template);
        assert_eq!(parsed.slots(EventType::Frame).len(), MAX_METRICS_PER_TYPE);
        assert!(text(&parsed).ends_with("%1frameNumber"));
        assert_eq!(parsed.text().len(), 16 + "%1frameNumber".len());
    }

    #[test]
    fn full_type_does_not_block_other_types() {
        let template = format!("{}%cpuUsage", "%1gpuTime".repeat(17));
        let parsed = parse(&template);
        assert_eq!(parsed.slots(EventType::Process).len(), 1);
    }

    #[test]
    fn output_is_bounded() {
        let template = "x".repeat(4 * MAX_PARSED_TEXT_SIZE);
        let parsed = parse(&template);
        assert_eq!(parsed.text().len(), MAX_PARSED_TEXT_SIZE - 1);
    }

    #[test]
    fn metric_overflowing_the_text_is_literal() {
        let mut template = "x".repeat(MAX_PARSED_TEXT_SIZE - 4);
        template.push_str("%9frameNumber");
        let parsed = parse(&template);
        assert!(parsed.slots(EventType::Frame).is_empty());
        assert_eq!(parsed.text().len(), MAX_PARSED_TEXT_SIZE - 1);
        assert!(text(&parsed).ends_with("x%9f"));
    }

    #[test]
    fn reparse_resets_slots() {
        let mut parsed = parse("%cpuUsage");
        let host = HostInfo::default();
        let graphics = GraphicsInfo::default();
        parsed.parse(
            b"plain",
            &KeywordContext {
                host: &host,
                graphics: &graphics,
            },
        );
        assert!(parsed.slots(EventType::Process).is_empty());
        assert_eq!(parsed.text(), b"plain");
    }
}
