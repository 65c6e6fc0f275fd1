use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use recon_oxide::capture::PcapBackend;
use recon_oxide::commands::{split_script, Command};
use recon_oxide::config::{Arguments, ReconConfig};
use recon_oxide::logging::init_logging;
use recon_oxide::recon::{ReconModule, Reply};

const PROMPT: &str = "recon> ";

/// Run one console line. Returns false when the console should close.
fn run_line(module: &mut ReconModule, line: &str) -> bool {
    let reply = line
        .parse::<Command>()
        .and_then(|command| module.handle(command));
    match reply {
        Ok(Reply::Silent) => {}
        Ok(Reply::Text(text)) => print!("{text}"),
        Ok(Reply::Quit) => return false,
        Err(e) => eprintln!("{e}"),
    }
    true
}

fn prompt() {
    print!("{PROMPT}");
    io::stdout().flush().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Arguments::parse();
    init_logging(&cli.log_level);

    let config = ReconConfig::try_from(&cli).context("invalid --alias")?;
    let mut module = ReconModule::new(config, Arc::new(PcapBackend));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if let Some(script) = &cli.eval {
        for line in split_script(script) {
            if !run_line(&mut module, line) {
                module.shutdown();
                return Ok(());
            }
        }
    }

    // stdin blocks, so it gets its own thread and Ctrl-C stays responsive.
    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines().map_while(Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("could not start console reader")?;

    prompt();
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                if !line.trim().is_empty() && !run_line(&mut module, &line) {
                    break;
                }
                prompt();
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    module.shutdown();
    Ok(())
}
