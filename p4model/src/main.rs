/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! `p4model` serves P4Runtime for the example DASH pipeline.

use anyhow::{Context, Result};

use clap::Parser;

use p4model::{dash, server, Device};

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use std::sync::Arc;

use tracing::{info, Level};

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// P4Runtime connection bind address
    #[clap(long, default_value = "0.0.0.0")]
    p4_addr: String,

    /// P4Runtime connection listening port (0 picks an unused port)
    #[clap(long, default_value_t = 9559)]
    p4_port: u16,

    /// Number of RPC worker threads
    #[clap(long, default_value_t = 10)]
    workers: usize,

    /// Log level: error, warn, info, debug or trace
    #[clap(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(args.log_level)
        .init();

    let pipeline = Arc::new(dash::pipeline()?);
    let device = Arc::new(Device::new(pipeline));
    let mut server = server::start(device, &args.p4_addr, args.p4_port, args.workers)?;
    for (addr, port) in server.bind_addrs() {
        info!("Listening on {}:{}", addr, port);
    }

    let mut signals = Signals::new(&[SIGINT, SIGTERM]).context("installing signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!("received signal {}, shutting down", signal);
    }
    futures::executor::block_on(server.shutdown()).context("shutting down P4Runtime server")?;
    Ok(())
}
