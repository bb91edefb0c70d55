//! noderpc CLI: call, batch and watch node RPC methods from the terminal.
//!
//! Usage:
//! ```bash
//! # Single call
//! noderpc call --url http://127.0.0.1:8027 --method chain_chainID
//!
//! # Batch call
//! noderpc batch --url http://127.0.0.1:8027 --method chain_chainID \
//!     --method chain_getBlockByHeight --params '[100]'
//!
//! # Print the stable height every time it changes
//! noderpc watch --url http://127.0.0.1:8027 --method chain_latestStableHeight
//! ```

mod config;

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use serde_json::Value;

use noderpc_core::{BatchEntry, Requester};
use noderpc_http::HttpTransport;

use crate::config::{init_tracing, ClientConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "call" => cmd_call(&args[2..]).await,
        "batch" => cmd_batch(&args[2..]).await,
        "watch" => cmd_watch(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("noderpc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("noderpc {}", env!("CARGO_PKG_VERSION"));
    println!("Call blockchain node JSON-RPC methods\n");
    println!("USAGE:");
    println!("    noderpc <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    call       Send one JSON-RPC call");
    println!("    batch      Send several calls as one batch");
    println!("    watch      Poll a method and print each new value");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>            Node endpoint  [required unless set in --config]");
    println!("    --config <FILE>        JSON config file (url, http, watch, log)");
    println!("    --method <NAME>        RPC method; repeatable for batch");
    println!("    --params <JSON>        Params as a JSON array; in a batch, applies to the");
    println!("                           --method just before it");
    println!("    --interval-ms <MS>     Poll interval for watch");
    println!("    --max-retry <N>        Failed polls tolerated by watch");
}

/// Load config, apply flag overrides, start logging and build a requester.
fn setup(args: &[String]) -> anyhow::Result<Requester> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => ClientConfig::load(Path::new(&path))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = parse_flag(args, "--url") {
        config.url = Some(url);
    }
    if let Some(ms) = parse_flag(args, "--interval-ms") {
        config.watch.interval_ms = ms.parse().context("--interval-ms must be an integer")?;
    }
    if let Some(n) = parse_flag(args, "--max-retry") {
        config.watch.max_retry = n.parse().context("--max-retry must be an integer")?;
    }

    init_tracing(&config.log);

    let url = config.url.clone().ok_or_else(|| anyhow!("--url is required"))?;
    tracing::debug!(url = %url, timeout_ms = config.http.request_timeout_ms, "using HTTP transport");
    let transport = HttpTransport::new(url, config.http.clone())?;
    let requester = Requester::builder()
        .transport(Arc::new(transport))
        .watch_config(config.watch.clone())
        .build()?;
    Ok(requester)
}

fn parse_params(args: &[String]) -> anyhow::Result<Vec<Value>> {
    match parse_flag(args, "--params") {
        Some(raw) => param_array(&raw),
        None => Ok(vec![]),
    }
}

fn param_array(raw: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str(raw).context("--params must be JSON")? {
        Value::Array(params) => Ok(params),
        other => bail!("--params must be a JSON array, got {other}"),
    }
}

/// Pair each `--method` with the `--params` that follows it, if any.
fn parse_batch(args: &[String]) -> anyhow::Result<Vec<BatchEntry>> {
    let mut entries: Vec<BatchEntry> = Vec::new();
    let mut has_params = false;
    for pair in args.windows(2) {
        match pair[0].as_str() {
            "--method" => {
                entries.push(BatchEntry::method(pair[1].clone()));
                has_params = false;
            }
            "--params" => {
                let Some(entry) = entries.last_mut() else {
                    bail!("--params must follow a --method");
                };
                if has_params {
                    bail!("{} has more than one --params", entry.method);
                }
                entry.params = param_array(&pair[1])?;
                has_params = true;
            }
            _ => {}
        }
    }
    Ok(entries)
}

async fn cmd_call(args: &[String]) -> anyhow::Result<()> {
    let requester = setup(args)?;
    let method = parse_flag(args, "--method").ok_or_else(|| anyhow!("--method is required"))?;
    let params = parse_params(args)?;

    let result = requester.send(&method, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_batch(args: &[String]) -> anyhow::Result<()> {
    let requester = setup(args)?;
    let entries = parse_batch(args)?;
    if entries.is_empty() {
        bail!("at least one --method is required");
    }

    let responses = requester.send_batch(entries).await?;
    println!("{}", serde_json::to_string_pretty(&responses)?);
    Ok(())
}

async fn cmd_watch(args: &[String]) -> anyhow::Result<()> {
    let requester = setup(args)?;
    let method = parse_flag(args, "--method").ok_or_else(|| anyhow!("--method is required"))?;
    let params = parse_params(args)?;

    let (handle, mut updates) = requester.watch_channel(&method, params)?;
    println!(
        "Watching {method} every {}ms (Ctrl-C to stop)",
        requester.watch_config().interval().as_millis()
    );

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(Ok(value)) => println!("{value}"),
                Some(Err(e)) => return Err(anyhow::Error::new(e).context(format!("watch on {method} gave up"))),
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                requester.stop_watch(handle);
                return Ok(());
            }
        }
    }
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
