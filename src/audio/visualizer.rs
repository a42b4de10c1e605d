//! Live spectrum rendering. Purely cosmetic; drawing failures never reach
//! the pipeline.

use std::io::Write;

/// Drawing surface the pump hands the mixed spectrum to once per tick.
pub trait SpectrumSurface: Send {
    fn draw(&mut self, bins: &[u8]);
}

/// One-line unicode bar meter on stderr, redrawn in place.
pub struct TerminalMeter {
    width: usize,
}

const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

impl TerminalMeter {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(8),
        }
    }

    fn render(&self, bins: &[u8]) -> String {
        let mut line = String::with_capacity(self.width + 2);
        line.push('\r');
        if bins.is_empty() {
            line.extend(std::iter::repeat(BLOCKS[0]).take(self.width));
            return line;
        }

        // Collapse the bins into `width` buckets, drawing each bucket's max
        let per_bucket = (bins.len() as f32 / self.width as f32).max(1.0);
        for i in 0..self.width {
            let start = (i as f32 * per_bucket) as usize;
            let end = (((i + 1) as f32 * per_bucket) as usize).min(bins.len());
            let peak = bins[start.min(bins.len() - 1)..end.max(start + 1).min(bins.len())]
                .iter()
                .copied()
                .max()
                .unwrap_or(0);
            let level = (peak as usize * (BLOCKS.len() - 1)) / 255;
            line.push(BLOCKS[level]);
        }
        line
    }
}

impl Default for TerminalMeter {
    fn default() -> Self {
        Self::new(48)
    }
}

impl SpectrumSurface for TerminalMeter {
    fn draw(&mut self, bins: &[u8]) {
        let line = self.render(bins);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Surface that draws nothing, for headless runs.
pub struct NullSurface;

impl SpectrumSurface for NullSurface {
    fn draw(&mut self, _bins: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_width() {
        let meter = TerminalMeter::new(16);
        let line = meter.render(&[0u8; 128]);
        assert_eq!(line.chars().count(), 17); // carriage return + 16 bars
    }

    #[test]
    fn test_silence_renders_flat() {
        let meter = TerminalMeter::new(8);
        let line = meter.render(&[0u8; 128]);
        assert!(line.chars().skip(1).all(|c| c == BLOCKS[0]));
    }

    #[test]
    fn test_full_scale_renders_full_blocks() {
        let meter = TerminalMeter::new(8);
        let line = meter.render(&[255u8; 128]);
        assert!(line.chars().skip(1).all(|c| c == BLOCKS[8]));
    }

    #[test]
    fn test_empty_bins_do_not_panic() {
        let meter = TerminalMeter::new(8);
        let line = meter.render(&[]);
        assert_eq!(line.chars().count(), 9);
    }
}
