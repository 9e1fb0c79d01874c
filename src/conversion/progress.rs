use regex::Regex;

/// Whole-batch progress, normalized against the frame estimate taken before
/// the first file starts. Starts out at 0%.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_frames: u64,
    processed_frames: u64,
    last_reported: u8,
}

impl ProgressTracker {
    pub fn new(total_frames: u64) -> Self {
        Self {
            total_frames,
            processed_frames: 0,
            last_reported: 0,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// floor(100 * processed / total), held at 99 until `finish`.
    /// `None` while the total is unknown.
    pub fn percentage(&self) -> Option<u8> {
        if self.total_frames == 0 {
            return None;
        }
        let raw = (self.processed_frames as u128 * 100) / self.total_frames as u128;
        Some(raw.min(99) as u8)
    }

    /// Counts one frame. Returns the new percentage only when it moved.
    pub fn record_frame(&mut self) -> Option<u8> {
        self.processed_frames = self.processed_frames.saturating_add(1);
        let current = self.percentage()?;
        if current > self.last_reported {
            self.last_reported = current;
            Some(current)
        } else {
            None
        }
    }

    /// Marks the batch as done. Returns 100 unless it was already reported.
    pub fn finish(&mut self) -> Option<u8> {
        if self.last_reported == 100 {
            return None;
        }
        self.last_reported = 100;
        Some(100)
    }
}

/// One line of `ffmpeg -progress` key=value output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLine {
    Frame(u64),
    End,
    Other,
}

pub struct ProgressParser {
    frame_regex: Regex,
    end_regex: Regex,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self {
            frame_regex: Regex::new(r"^frame=\s*(\d+)\s*$").expect("frame pattern is valid"),
            end_regex: Regex::new(r"^progress=end\s*$").expect("end pattern is valid"),
        }
    }

    pub fn parse_line(&self, line: &str) -> ProgressLine {
        let line = line.trim();
        if let Some(caps) = self.frame_regex.captures(line) {
            return caps[1]
                .parse()
                .map(ProgressLine::Frame)
                .unwrap_or(ProgressLine::Other);
        }
        if self.end_regex.is_match(line) {
            return ProgressLine::End;
        }
        ProgressLine::Other
    }
}

impl Default for ProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns cumulative frame counts into per-frame deltas.
#[derive(Debug, Default)]
pub struct FrameCounter {
    last_frame: u64,
}

impl FrameCounter {
    pub fn advance(&mut self, cumulative: u64) -> u64 {
        let delta = cumulative.saturating_sub(self.last_frame);
        self.last_frame = self.last_frame.max(cumulative);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_floor_of_ratio() {
        let mut tracker = ProgressTracker::new(3);
        assert_eq!(tracker.record_frame(), Some(33));
        assert_eq!(tracker.record_frame(), Some(66));
    }

    #[test]
    fn test_percentage_held_below_100_until_finish() {
        let mut tracker = ProgressTracker::new(2);
        tracker.record_frame();
        assert_eq!(tracker.record_frame(), Some(99));
        // Underestimated totals keep counting without exceeding 99.
        assert_eq!(tracker.record_frame(), None);
        assert_eq!(tracker.percentage(), Some(99));
        assert_eq!(tracker.finish(), Some(100));
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn test_zero_total_never_divides() {
        let mut tracker = ProgressTracker::new(0);
        for _ in 0..10 {
            assert_eq!(tracker.record_frame(), None);
        }
        assert_eq!(tracker.percentage(), None);
        assert_eq!(tracker.finish(), Some(100));
    }

    #[test]
    fn test_only_increases_are_reported() {
        let mut tracker = ProgressTracker::new(1000);
        let reported: Vec<u8> = (0..1000).filter_map(|_| tracker.record_frame()).collect();
        assert_eq!(reported.len(), 99);
        assert!(reported.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(reported.last(), Some(&99));
    }

    #[test]
    fn test_parse_progress_lines() {
        let parser = ProgressParser::new();
        assert_eq!(parser.parse_line("frame=120"), ProgressLine::Frame(120));
        assert_eq!(parser.parse_line("frame=  7\n"), ProgressLine::Frame(7));
        assert_eq!(parser.parse_line("progress=end"), ProgressLine::End);
        assert_eq!(parser.parse_line("progress=continue"), ProgressLine::Other);
        assert_eq!(parser.parse_line("fps=29.97"), ProgressLine::Other);
        assert_eq!(parser.parse_line("frame=N/A"), ProgressLine::Other);
    }

    #[test]
    fn test_frame_counter_ignores_regressions() {
        let mut counter = FrameCounter::default();
        assert_eq!(counter.advance(10), 10);
        assert_eq!(counter.advance(25), 15);
        assert_eq!(counter.advance(20), 0);
        assert_eq!(counter.advance(26), 1);
    }
}
