//! Line-oriented control console.
//!
//! Reads one JSON request per line, answers with one JSON line:
//!
//! ```text
//! > {"op":"status"}
//! < {"bench_id":"BENCH_001","policy":"binary","occupied":false,...}
//! > {"op":"set_mode","mode":2}
//! ```
//!
//! Runs on its own thread over stdin/stdout in the binary, and over
//! in-memory buffers in tests.

use core::sync::atomic::{AtomicBool, Ordering};
use std::io::{self, BufRead, Write};

use crate::app::control::ControlSurface;
use crate::app::ports::{ChimePort, DisplayPort, IndicatorPort};

/// Serve requests until EOF or until `running` clears.
///
/// Returns the number of requests answered.  A blocking read is not
/// interrupted by `running`; the flag is checked between lines.
pub fn serve<H, R, W>(
    surface: &ControlSurface<H>,
    input: R,
    mut output: W,
    running: &AtomicBool,
) -> io::Result<u64>
where
    H: IndicatorPort + DisplayPort + ChimePort,
    R: BufRead,
    W: Write,
{
    let mut handled = 0;
    for line in input.lines() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = surface.handle_json(line);
        writeln!(output, "{reply}")?;
        output.flush()?;
        handled += 1;
    }
    log::debug!("Control console closed after {} request(s)", handled);
    Ok(handled)
}
