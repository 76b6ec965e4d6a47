//! MNBQR command-line entrypoint

use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use mnbqr::{Error, Kind, MnbQrConfig, OutputOptions, Record, Result, logging, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "mnbqr",
    version,
    about = "Hungarian instant payment QR code generator"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to mnbqr.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the payment record and write it as a PNG QR code
    Generate(GenerateArgs),

    /// Serve the one-shot JSON to PNG HTTP endpoint
    #[cfg(feature = "server")]
    Serve {
        /// Listen address, e.g. `:8080` or `127.0.0.1:9000`
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Code type: RTP (request to pay) or HCT (credit transfer)
    #[arg(long = "type", default_value = "RTP")]
    kind: String,

    /// BIC code (8 or 11 characters)
    #[arg(long, default_value = "")]
    bic: String,

    /// Account holder name
    #[arg(long, default_value = "")]
    name: String,

    /// IBAN number
    #[arg(long, default_value = "")]
    iban: String,

    /// Amount in HUF; 0 leaves the amount empty
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    amount: i64,

    /// ISO purpose code (e.g. RENT)
    #[arg(long)]
    purpose: Option<String>,

    /// Message shown to the payer
    #[arg(long, default_value = "")]
    message: String,

    /// Shop id
    #[arg(long)]
    shop_id: Option<String>,

    /// Merchant device id
    #[arg(long)]
    merch_dev_id: Option<String>,

    /// Invoice id
    #[arg(long)]
    invoice_id: Option<String>,

    /// Customer id
    #[arg(long)]
    customer_id: Option<String>,

    /// Credit transfer id
    #[arg(long)]
    cred_tran_id: Option<String>,

    /// Loyalty id
    #[arg(long)]
    loyalty_id: Option<String>,

    /// NAV check id
    #[arg(long)]
    nav_check_id: Option<String>,

    /// Format version (three digits)
    #[arg(long)]
    format_version: Option<String>,

    /// Character set id
    #[arg(long)]
    charset: Option<u8>,

    /// Validity window in seconds (defaults to the configured window)
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    valid_for: Option<i64>,

    /// Minimum PNG size in pixels
    #[arg(long, value_name = "PIXELS")]
    size: Option<u32>,

    /// PNG output path
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Open the PNG with the configured viewer
    #[arg(long)]
    open: bool,

    /// Only print the record, do not write a PNG
    #[arg(long, conflicts_with = "open")]
    no_png: bool,
}

type TextSetter = fn(&mut Record, &str) -> Result<()>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = MnbQrConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    match cli.command {
        Command::Generate(args) => generate(args, &config.output).await,
        #[cfg(feature = "server")]
        Command::Serve { listen } => {
            let mut config = config;
            if let Some(listen) = listen {
                let (host, port) = listen
                    .rsplit_once(':')
                    .ok_or_else(|| Error::Config(format!("Invalid listen address '{listen}'")))?;
                if !host.is_empty() {
                    config.server.bind_address = host.to_string();
                }
                config.server.port = port
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid port '{port}': {e}")))?;
            }
            mnbqr::server::serve(&config.server).await
        }
    }
}

async fn generate(args: GenerateArgs, options: &OutputOptions) -> Result<()> {
    let kind: Kind = args.kind.to_uppercase().parse()?;
    let mut record = Record::with_recipient(kind, &args.bic, &args.name, &args.iban)?;

    if let Some(version) = &args.format_version {
        record.set_version(version)?;
    }
    if let Some(charset) = args.charset {
        record.set_charset(charset)?;
    }
    record.set_huf_amount(args.amount)?;
    if let Some(purpose) = &args.purpose {
        record.set_purpose(purpose)?;
    }
    record.set_message(&args.message)?;

    let references: [(Option<&String>, TextSetter); 7] = [
        (args.shop_id.as_ref(), Record::set_shop_id),
        (args.merch_dev_id.as_ref(), Record::set_merch_dev_id),
        (args.invoice_id.as_ref(), Record::set_invoice_id),
        (args.customer_id.as_ref(), Record::set_customer_id),
        (args.cred_tran_id.as_ref(), Record::set_cred_tran_id),
        (args.loyalty_id.as_ref(), Record::set_loyalty_id),
        (args.nav_check_id.as_ref(), Record::set_nav_check_id),
    ];
    for (value, setter) in references {
        if let Some(value) = value {
            setter(&mut record, value)?;
        }
    }

    let valid_for = args.valid_for.unwrap_or(options.valid_for_secs);
    let valid_until = Duration::try_seconds(valid_for)
        .and_then(|window| Utc::now().checked_add_signed(window))
        .ok_or_else(|| Error::Config(format!("Invalid validity window {valid_for}s")))?;
    record.set_valid_until(valid_until)?;

    println!("{}", record.serialize());
    if args.no_png {
        return Ok(());
    }

    let size = args.size.unwrap_or(options.png_size);
    let png = record.generate_png(size)?;
    let path = args.output.unwrap_or_else(|| options.path.clone());
    output::write_png(&path, &png).await?;
    info!(kind = %kind, path = %path.display(), "Payment code ready");

    if args.open {
        let viewer = options
            .viewer
            .as_deref()
            .ok_or_else(|| Error::Config("No image viewer configured".to_string()))?;
        output::open_viewer(viewer, &path).await?;
    }

    Ok(())
}
