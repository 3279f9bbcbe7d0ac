//! Layout features: whitespace habits of a source file.

use crate::tokenizer::is_space;

/// Six layout measurements of one source buffer.
///
/// Ratios with a zero denominator are reported as `0.0`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LayoutFeatures {
    /// Tabs per byte.
    pub tab_ratio: f64,
    /// Spaces per byte.
    pub space_ratio: f64,
    /// Empty lines per byte.
    pub empty_line_ratio: f64,
    /// Whitespace bytes per non-whitespace byte.
    pub whitespace_ratio: f64,
    /// Opening braces mostly start their own line.
    pub brace_on_own_line: bool,
    /// More lines are indented with a tab than with a space.
    pub tab_indented: bool,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl LayoutFeatures {
    /// Measure `source` up to its first zero byte.
    pub fn from_source(source: &[u8]) -> Self {
        let n = source.iter().position(|&b| b == 0).unwrap_or(source.len());
        let text = &source[..n];

        let mut at_line_start = true;
        let (mut tabs, mut spaces, mut whitespace) = (0usize, 0usize, 0usize);
        let (mut empty_lines, mut tab_lines, mut space_lines) = (0usize, 0usize, 0usize);
        // +1 for a brace that opens its line, -1 otherwise; only the sign is used.
        let mut brace_balance: i64 = 0;

        for (i, &b) in text.iter().enumerate() {
            if is_space(b) {
                match b {
                    b'\t' => tabs += 1,
                    b' ' => spaces += 1,
                    b'\n' => at_line_start = true,
                    _ => {}
                }
                whitespace += 1;
            } else {
                if b == b'{' {
                    brace_balance += if at_line_start { 1 } else { -1 };
                }
                at_line_start = false;
            }

            if i > 0 && text[i - 1] == b'\n' {
                match b {
                    b'\n' | b'\r' => empty_lines += 1,
                    b'\t' => tab_lines += 1,
                    b' ' => space_lines += 1,
                    _ => {}
                }
            }
        }

        LayoutFeatures {
            tab_ratio: ratio(tabs, n),
            space_ratio: ratio(spaces, n),
            empty_line_ratio: ratio(empty_lines, n),
            whitespace_ratio: ratio(whitespace, n - whitespace),
            brace_on_own_line: brace_balance > 0,
            tab_indented: tab_lines > space_lines,
        }
    }
}
