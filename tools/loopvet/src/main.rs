// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

mod args;
mod check;

use crate::args::Args;
use crate::check::{analyze, collect_sources, emit};
use clap::Parser;
use loopvet_analysis::LoopCapturePass;
use loopvet_analysis::pass::NAME;
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;

fn main() -> Result<(), eyre::Report> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    let main_subscriber = tracing_subscriber::fmt()
        .compact()
        .with_ansi(args.color)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NONE)
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(main_subscriber).unwrap_or_else(|e| {
        eprintln!("Unable to set configure logging: {e}");
        std::process::exit(1);
    });

    let version = env!("CARGO_PKG_VERSION");
    info!("loopvet {version} ({NAME})");

    let config = args.load_config()?;
    debug!(?config, "configuration");

    let sources = collect_sources(&args.paths)?;
    let pass = LoopCapturePass::new(config);
    let reports = analyze(&pass, &sources);

    let mut stdout = std::io::stdout().lock();
    let code = emit(&reports, args.format, args.color, &mut stdout)?;
    stdout.flush()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
