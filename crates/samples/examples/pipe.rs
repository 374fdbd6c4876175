//! Serve one sample surface over stdin/stdout.
//!
//! The downstream channel is written to stdout in the configured framing.
//! Each stdin line is posted as an upstream request body, and its response
//! frames are written to stdout as well. Logs go to stderr.

use std::{io::stderr, path::PathBuf, process};

use a2ui::{Config, codec::Framing, config::SessionMode, message::Frame};
use a2ui_samples::engine;
use anyhow::Result;
use clap::Parser;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
    select, signal,
};
use tracing::Level;

/// CLI flags for the pipe launcher.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Surface to open.
    #[arg(value_name = "SURFACE", default_value = "contacts")]
    surface: String,

    /// TOML configuration file.
    #[clap(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use newline-delimited JSON instead of SSE.
    #[clap(long)]
    jsonl: bool,

    /// Share one surface between connections.
    #[clap(long)]
    shared: bool,

    /// Keepalive idle period in milliseconds.
    #[arg(long, value_name = "MILLISECONDS")]
    keepalive_ms: Option<u64>,

    /// Driver step interval in milliseconds.
    #[arg(long, value_name = "MILLISECONDS")]
    tick_ms: Option<u64>,

    /// List available surfaces and exit.
    #[clap(short, long)]
    list: bool,

    /// Log at debug level.
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    /// Load the configuration file, then apply flag overrides.
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if self.jsonl {
            config.framing = Framing::Jsonl;
        }
        if self.shared {
            config.session_mode = SessionMode::Shared;
        }
        if let Some(ms) = self.keepalive_ms {
            config.keepalive_ms = ms.max(1);
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms.max(1);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Write one frame to stdout.
async fn write(out: &mut io::Stdout, framing: Framing, frame: &Frame) -> Result<()> {
    out.write_all(framing.encode(frame)?.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = args.config()?;
    let framing = config.framing;
    let engine = engine(config);
    if args.list {
        for id in engine.surface_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let mut down = match engine.open(&args.surface) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}; available: {}", engine.surface_ids().join(", "));
            process::exit(1);
        }
    };
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        select! {
            frame = down.recv() => {
                let Some(frame) = frame else { break };
                write(&mut stdout, framing, &frame).await?;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                for frame in engine.post(&args.surface, line).collect().await {
                    write(&mut stdout, framing, &frame).await?;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }
    Ok(())
}
