//! Terminal rendering of the progress region
//!
//! Layout of the region owned by the renderer:
//!
//! ```text
//! A total of 15 tables need to be compared
//!
//! Comparing the table structure of `schema1.table1` ... equivalent
//! Comparing the table data of `schema1.table1` ... equivalent
//! Comparing the table structure of `schema2.table2` ... equivalent
//! Comparing the table data of `schema2.table2` ...
//! _____________________________________________________________________________
//! Progress [=====================-------------------------------------] 35% 70/200
//! ```
//!
//! Fixed lines are printed once. The volatile block (data checks still
//! running), the separator and the bar are erased and rewritten.

use crate::registry::{Counters, DisplayPass, FixedLine, Registry};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Width of the progress bar in characters
pub const BAR_WIDTH: usize = 60;

const SEPARATOR: &str =
    "_____________________________________________________________________________";

/// Move the cursor up `lines` lines and clear to the end of the screen
pub fn erase_lines(lines: usize) -> String {
    if lines == 0 {
        "\x1b[J".to_string()
    } else {
        format!("\x1b[{}A\x1b[J", lines)
    }
}

/// Banner written once when the printer starts
pub fn header(expected_tables: u64) -> String {
    format!("A total of {} tables need to be compared\n\n\n", expected_tables)
}

/// Damped completion ratio as an exact fraction `(numerator, denominator)`.
///
/// The ratio is
/// `remaining * progress / (expected * (remaining + 1) * (total + 1)) + finished / expected`
/// with `remaining = 1000 * (expected - finished)`. Active tables contribute a
/// share that vanishes as the number of finished tables approaches the
/// expected count, so the bar only reaches 100% once the last table has
/// finished. Returns `None` when the terms do not fit in `u128`.
fn completion_fraction(counters: &Counters) -> Option<(u128, u128)> {
    let expected = u128::from(counters.expected);
    let finished = u128::from(counters.finished.min(counters.expected));
    let progress = u128::from(counters.progress);
    let remaining = 1000 * (expected - finished);
    let scale = (remaining + 1).checked_mul(u128::from(counters.total) + 1)?;

    let denominator = expected.checked_mul(scale)?;
    let numerator = remaining
        .checked_mul(progress)?
        .checked_add(finished.checked_mul(scale)?)?;
    Some((numerator, denominator))
}

/// Damped completion ratio in `[0, 1]`
pub fn completion_coefficient(counters: &Counters) -> f64 {
    if counters.expected == 0 {
        return 1.0;
    }
    match completion_fraction(counters) {
        Some((numerator, denominator)) => (numerator as f64 / denominator as f64).clamp(0.0, 1.0),
        None => (counters.finished.min(counters.expected) as f64 / counters.expected as f64),
    }
}

/// Number of filled bar cells and the displayed percentage, both floored
pub fn bar_metrics(counters: &Counters) -> (usize, u32) {
    if counters.expected == 0 {
        return (BAR_WIDTH, 100);
    }
    let (numerator, denominator) = completion_fraction(counters).unwrap_or((
        u128::from(counters.finished.min(counters.expected)),
        u128::from(counters.expected),
    ));
    let filled = (BAR_WIDTH as u128 * numerator / denominator).min(BAR_WIDTH as u128) as usize;
    let percent = (100 * numerator / denominator).min(100) as u32;
    (filled, percent)
}

pub fn progress_bar_line(counters: &Counters) -> String {
    let (filled, percent) = bar_metrics(counters);
    format!(
        "Progress [{}{}] {}% {}/{}\n",
        "=".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent,
        counters.progress,
        counters.total
    )
}

fn fixed_line(line: &FixedLine) -> String {
    match line {
        FixedLine::StructureEquivalent(name) => {
            format!("Comparing the table structure of `{}` ... equivalent\n", name)
        }
        FixedLine::StructureFailed(name) => {
            format!("Comparing the table structure of `{}` ... failure\n", name)
        }
        FixedLine::DataEquivalent(name) => {
            format!("Comparing the table data of `{}` ... equivalent\n", name)
        }
        FixedLine::DataFailed(name) => {
            format!("Comparing the table data of `{}` ... failure\n", name)
        }
    }
}

/// Repaints the progress region from registry snapshots
#[derive(Debug)]
pub struct Renderer {
    lines_printed: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// The last blank line of the header is the initial bar slot
    pub fn new() -> Self {
        Self { lines_printed: 1 }
    }

    /// Lines the next full repaint will erase
    pub fn lines_printed(&self) -> usize {
        self.lines_printed
    }

    /// Build the text of one render tick.
    ///
    /// A dirty registry gets a full structural repaint; otherwise only the
    /// bar line is replaced. The bar is recomputed either way.
    pub fn frame(&mut self, registry: &mut Registry) -> String {
        let mut frame = if registry.is_dirty() {
            let erase = erase_lines(self.lines_printed);
            let pass = registry.advance_display();
            self.lines_printed = pass.comparing.len() + 2;
            erase + &structural_block(&pass)
        } else {
            erase_lines(1)
        };
        frame.push_str(&progress_bar_line(&registry.counters()));
        frame
    }

    /// Render one tick to `out` with a single write
    pub fn render<W: Write + ?Sized>(&mut self, registry: &mut Registry, out: &mut W) -> io::Result<()> {
        let frame = self.frame(registry);
        out.write_all(frame.as_bytes())?;
        out.flush()
    }
}

fn structural_block(pass: &DisplayPass) -> String {
    let mut block: String = pass.fixed.iter().map(fixed_line).collect();
    for name in &pass.comparing {
        let _ = writeln!(block, "Comparing the table data of `{}` ...", name);
    }
    block.push_str(SEPARATOR);
    block.push('\n');
    block
}
