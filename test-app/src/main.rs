// catlink test application -- CLI tool for opening an Elecraft rig, showing
// the negotiated capabilities and sending CAT traffic, against real hardware
// or a simulated K3.
//
// Usage:
//   catlink-test-app list
//   catlink-test-app --model K3 --port /dev/ttyUSB0 open
//   catlink-test-app --model K2 --port /dev/ttyUSB0 --baud 4800 freq get
//   catlink-test-app --model KX3 --port /dev/ttyUSB0 freq set 14074000
//   catlink-test-app --model K3 --port /dev/ttyUSB0 send MD
//   catlink-test-app --mock -vv open

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use catlink::elecraft::builder::ElecraftBuilder;
use catlink::elecraft::models::{self as elecraft_models, ElecraftModel};
use catlink::elecraft::{ElecraftRig, SubDevice};
use catlink::text_io::Request;
use catlink_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// catlink test application -- opens a rig and exercises the CAT engine.
#[derive(Parser)]
#[command(name = "catlink-test-app", version, about)]
struct Cli {
    /// Rig model name (K2, K3, K3S, KX3, KX2).
    #[arg(long, default_value = "K3")]
    model: String,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock.
    #[arg(long)]
    port: Option<String>,

    /// Override the default baud rate for this model.
    #[arg(long)]
    baud: Option<u32>,

    /// Simulate a K3 (ID017, K22, K31) instead of opening a serial port.
    #[arg(long)]
    mock: bool,

    /// Total attempts per transaction, first one included.
    #[arg(long, default_value_t = 3)]
    attempts: u32,

    /// Per-attempt reply timeout in milliseconds.
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// RUST_LOG takes precedence when set.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported models.
    List,

    /// Open the rig and print its identity and extension levels.
    Open,

    /// Send a raw CAT command and print the reply.
    Send {
        /// Command token (e.g. MD, FA, K3).
        token: String,
        /// Parameters appended after the token.
        #[arg(default_value = "")]
        params: String,
        /// Accept a reply that does not echo the token.
        #[arg(long)]
        bare: bool,
    },

    /// VFO-A frequency operations.
    Freq {
        #[command(subcommand)]
        action: FreqAction,
    },
}

#[derive(Subcommand)]
enum FreqAction {
    /// Read the VFO-A frequency.
    Get,
    /// Set the VFO-A frequency in hertz.
    Set { freq_hz: u64 },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn lookup_model(name: &str) -> Result<ElecraftModel> {
    elecraft_models::find_model(name).with_context(|| {
        let names: Vec<_> = elecraft_models::all_elecraft_models()
            .iter()
            .map(|m| m.name)
            .collect();
        format!("unknown model '{name}'. Supported: {}", names.join(", "))
    })
}

/// A mock that answers the open sequence like a K3 in extended mode, plus
/// whatever the requested command will send.
fn simulated_k3(command: &Command) -> MockTransport {
    let mock = MockTransport::new();
    mock.expect(b"ID;", b"ID017;");
    mock.expect(b"K2;", b"K22;");
    mock.expect(b"K3;", b"K31;");

    match command {
        Command::Send { token, params, .. } => {
            let frame = format!("{token}{params};");
            mock.expect(frame.as_bytes(), frame.as_bytes());
        }
        Command::Freq {
            action: FreqAction::Get,
        } => mock.expect(b"FA;", b"FA00014074000;"),
        Command::Freq {
            action: FreqAction::Set { freq_hz },
        } => mock.expect_silence(format!("FA{freq_hz:011};").as_bytes()),
        Command::List | Command::Open => {}
    }
    mock
}

async fn open_rig(cli: &Cli) -> Result<ElecraftRig> {
    let mut model = lookup_model(&cli.model)?;
    if cli.mock && model.model_id != "K3" {
        debug!(requested = model.name, "mock simulates a K3");
        model = elecraft_models::k3();
    }

    let builder = ElecraftBuilder::new(model.clone())
        .max_attempts(cli.attempts)
        .command_timeout(Duration::from_millis(cli.timeout_ms));

    if cli.mock {
        let rig = builder
            .build_with_transport(Box::new(simulated_k3(&cli.command)))
            .await
            .context("failed to open simulated rig")?;
        println!("Connected (mock transport) -- Elecraft {}", model.name);
        return Ok(rig);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let baud = cli.baud.unwrap_or(model.default_baud_rate);

    let rig = builder
        .serial_port(port)
        .baud_rate(baud)
        .build()
        .await
        .with_context(|| format!("failed to open Elecraft {} on {port} at {baud} baud", model.name))?;

    println!("Connected to {port} at {baud} baud -- Elecraft {}", model.name);
    Ok(rig)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    println!("{:<6}  {:<8}  {:>6}  Sub RX", "Model", "Cmd set", "Baud");
    println!("{:<6}  {:<8}  {:>6}  ------", "-----", "-------", "------");
    for model in elecraft_models::all_elecraft_models() {
        println!(
            "{:<6}  {:<8}  {:>6}  {}",
            model.name,
            model.model_id,
            model.default_baud_rate,
            if model.has_sub_receiver { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn cmd_open(rig: &ElecraftRig) -> Result<()> {
    println!("Identity:      {}", rig.identity());
    for sub in [SubDevice::K2, SubDevice::K3] {
        println!("{sub} extension:  {}", rig.extension_level(sub));
    }
    Ok(())
}

async fn cmd_send(rig: &ElecraftRig, token: &str, params: &str, bare: bool) -> Result<()> {
    let mut request = Request::new(token).params(params);
    if bare {
        request = request.bare_reply();
    }
    let reply = rig
        .command(&request)
        .await
        .with_context(|| format!("{token}{params}; failed"))?;
    println!("{};  ({} attempt(s))", reply.body(), reply.attempts());
    Ok(())
}

async fn cmd_freq_get(rig: &ElecraftRig) -> Result<()> {
    let hz = rig.get_frequency().await.context("failed to read frequency")?;
    println!("VFO-A: {hz} Hz ({:.6} MHz)", hz as f64 / 1e6);
    Ok(())
}

async fn cmd_freq_set(rig: &ElecraftRig, freq_hz: u64) -> Result<()> {
    rig.set_frequency(freq_hz)
        .await
        .context("failed to set frequency")?;
    println!("VFO-A set to {freq_hz} Hz");
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.attempts == 0 {
        bail!("--attempts must be at least 1");
    }

    // The `list` command does not require a rig connection.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let rig = open_rig(&cli).await?;

    let result = match &cli.command {
        Command::Open => cmd_open(&rig),
        Command::Send {
            token,
            params,
            bare,
        } => cmd_send(&rig, token, params, *bare).await,
        Command::Freq { action } => match action {
            FreqAction::Get => cmd_freq_get(&rig).await,
            FreqAction::Set { freq_hz } => cmd_freq_set(&rig, *freq_hz).await,
        },
        Command::List => unreachable!("list handled above"),
    };

    rig.close().await.context("failed to close rig")?;
    result
}
