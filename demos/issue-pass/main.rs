use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wallet_passes::{
    apple::{
        self,
        parameters::{PassStyle, SerialNumber},
        AppleWallet,
    },
    config::WalletsConfig,
    core::object::UntypedObject,
    google::{self, GoogleWallet, WalletObject},
};

#[derive(Parser, Debug)]
#[command(name = "issue-pass")]
#[command(about = "Issue a wallet pass with the configuration read from the environment")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a signed `.pkpass` archive
    Apple {
        #[arg(long, default_value = "12345678")]
        serial_number: String,

        /// Pass style holding the fields
        #[arg(long, default_value = "generic")]
        style: String,

        /// Message encoded in the QR code
        #[arg(long)]
        barcode: String,

        #[arg(long, default_value = "Event")]
        title: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Publish a generic object and print its save link
    Google {
        /// Object id, without the issuer prefix
        #[arg(long)]
        object: String,

        /// Class id, without the issuer prefix
        #[arg(long)]
        class: String,

        #[arg(long)]
        barcode: String,

        #[arg(long, default_value = "Event")]
        title: String,

        #[arg(long)]
        header: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level);

    let config = WalletsConfig::from_env()?;

    match cli.command {
        Command::Apple {
            serial_number,
            style,
            barcode,
            title,
            out,
        } => {
            let wallet = AppleWallet::new(&config)?;
            let mut overrides = UntypedObject::new();
            overrides.insert(SerialNumber(serial_number));

            let pkpass = wallet
                .build_pass(overrides)
                .with_barcode(apple::parameters::Barcode::qr(barcode))
                .with_pass_style(PassStyle::from(style))
                .add_primary_field("title", "Event", title)
                .download()
                .await?;

            let path = out.join(pkpass.file_name());
            tokio::fs::write(&path, pkpass.bytes())
                .await
                .with_context(|| format!("unable to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        Command::Google {
            object,
            class,
            barcode,
            title,
            header,
        } => {
            let wallet = GoogleWallet::new(&config)?;
            let mut builder = wallet
                .build_object(&object, &class)
                .with_card_title(title)
                .with_barcode(google::parameters::Barcode::qr(barcode));
            if let Some(header) = header {
                builder = builder.with_header(header);
            }

            let object = builder.find_or_create().await?;
            println!("{}", wallet.save_link(object.id(), object.class_id())?);
        }
    }

    Ok(())
}

/// Setup tracing subscriber for logging
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}
