use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use shellexpect::{EchoMode, Expect, ShellConfig, ShellSession};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = init_subscriber(args.debug) {
        eprintln!("failed to initialize logging: {e}");
    }

    if let Err(e) = start(args).await {
        tracing::error!(error = ?e);
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Run commands in an interactive shell, one prompt at a time.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Prompt sentinel; `\n`, `\r`, `\t` and `\\` are unescaped.
    #[clap(long, default_value = "##\\n")]
    sentinel: String,

    /// Variable to assign the sentinel to (e.g. PS1, or PROMPT for zsh).
    ///
    /// Without it the prompt must already be set, e.g. with `--env PS1=...`.
    #[clap(long)]
    prompt_var: Option<String>,

    /// Timeout in seconds for the first prompt and for each command.
    #[clap(short, long, default_value = "30")]
    timeout: u64,

    /// Extra environment entry for the shell (KEY=VALUE).
    #[clap(short, long = "env")]
    env: Vec<String>,

    /// How the echoed command line is removed.
    #[clap(long, value_enum, default_value = "detect")]
    echo: EchoArg,

    /// Echo terminal traffic to stderr and log at debug level.
    #[clap(short, long)]
    debug: bool,

    /// Command to run; repeat for several.
    #[clap(short = 'c', long = "command", required = true)]
    commands: Vec<String>,

    /// Shell program and its arguments.
    #[clap(last = true, required = true)]
    shell: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EchoArg {
    Detect,
    Echoed,
    Silent,
}

impl From<EchoArg> for EchoMode {
    fn from(value: EchoArg) -> Self {
        match value {
            EchoArg::Detect => EchoMode::Detect,
            EchoArg::Echoed => EchoMode::Echoed,
            EchoArg::Silent => EchoMode::Silent,
        }
    }
}

async fn start(args: Cli) -> Result<()> {
    let Some((program, shell_args)) = args.shell.split_first() else {
        bail!("no shell given");
    };

    let timeout = Duration::from_secs(args.timeout);
    let sentinel = unescape(&args.sentinel);
    if sentinel.is_empty() {
        bail!("sentinel must not be empty");
    }

    let process = Expect::builder(program.as_str())
        .args(shell_args)
        .envs(&args.env)
        .timeout(timeout)
        .debug(args.debug)
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;

    let mut config = ShellConfig::new(sentinel)
        .echo_mode(args.echo.into())
        .timeout(timeout);
    if let Some(variable) = args.prompt_var {
        config = config.prompt_variable(variable);
    }

    let mut shell = ShellSession::with_config(process, config);
    shell.init().await.context("shell did not show its prompt")?;

    for command in &args.commands {
        let lines = shell
            .run(command)
            .await
            .with_context(|| format!("command failed: {command}"))?;
        for line in lines {
            println!("{line}");
        }
    }

    shell.close()?;
    Ok(())
}

/// Resolve the backslash escapes accepted in `--sentinel`.
fn unescape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('r') => output.push('\r'),
            Some('t') => output.push('\t'),
            Some(other) => output.push(other),
            None => output.push('\\'),
        }
    }
    output
}

fn init_subscriber(debug: bool) -> Result<()> {
    let default_log_level = if debug {
        "shellexpect=debug"
    } else {
        "shellexpect=warn"
    };
    let env_layer = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level.to_owned()),
    );
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
