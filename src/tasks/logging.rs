/* ********************************************************************** **
**  This file is part of nnip.                                            **
**                                                                        **
**  nnip is free software: you can redistribute it and/or modify it under **
**  the terms of the GNU General Public License as published by the Free  **
**  Software Foundation, either version 3 of the License, or (at your     **
**  option) any later version.                                            **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of nnip is licensed under the GPL, many  **
** parts of it are licensed under more permissive terms.                  **
** ********************************************************************** */

use crate::FailResult;

use std::fmt;
use std::path::Path;
use std::time::Instant;
use log::{Level, LevelFilter};

const OUR_CRATES: &[&str] = &["nnip_tasks", "nnip_potentials", "nnip_config"];

/// Install the global logger, writing to stderr and optionally to a file.
///
/// `verbosity` counts the `-v` flags: 0 shows info from nnip's own crates,
/// 1 shows debug, and 2 or more shows trace.
///
/// Only the first call has any effect; later calls return an error.
pub fn init_global_logger(logfile: Option<&Path>, verbosity: u64) -> FailResult<()> {
    let ours = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let start = Instant::now();
    let mut fern = fern::Dispatch::new()
        .format(move |out, message, record| {
            let t = start.elapsed();
            out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                t.as_secs(),
                t.subsec_millis(),
                record.target(),
                ColorizedLevel(record.level()),
                message))
        })
        .level(LevelFilter::Warn);
    for &krate in OUR_CRATES {
        fern = fern.level_for(krate, ours);
    }

    // stdout is reserved for the computed results
    fern = fern.chain(std::io::stderr());
    if let Some(path) = logfile {
        fern = fern.chain(fern::log_file(path)?);
    }

    fern.apply()?;
    Ok(())
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(self.0.to_string()))
    }
}
