//! `openvoucher`: authority-side tooling.
//!
//! ```text
//! openvoucher keygen
//! openvoucher sign --key 0x.. --amount 1000 --fee 5 --recipient 0x.. --unique-id 42 --expires-at 1800000000
//! openvoucher digest voucher.json
//! openvoucher verify voucher.json --authority 0x..
//! ```

mod commands;

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use openvoucher_types::{Address, UniqueId};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "openvoucher")]
#[command(about = "Issue and inspect OpenVoucher payout vouchers")]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a fresh authority key
    Keygen,

    /// Issue a signed voucher and print it as JSON
    Sign {
        /// Authority secret key (hex, optional 0x prefix)
        #[arg(long, env = "OPENVOUCHER_AUTHORITY_KEY")]
        key: String,
        /// Payout asset amount
        #[arg(long)]
        amount: u128,
        /// Settlement fee
        #[arg(long, default_value_t = 0)]
        fee: u128,
        /// Recipient address (0x..)
        #[arg(long)]
        recipient: Address,
        /// Replay-protection nonce
        #[arg(long)]
        unique_id: UniqueId,
        /// Expiry, unix seconds (exclusive)
        #[arg(long)]
        expires_at: u64,
        /// Write the voucher here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the canonical encoding and digests of a voucher file
    Digest {
        /// Voucher JSON file
        voucher: PathBuf,
    },

    /// Recover the signer of a voucher file and check it against an authority
    Verify {
        /// Voucher JSON file
        voucher: PathBuf,
        /// Expected authority address (0x..)
        #[arg(long)]
        authority: Address,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let result = match cli.command {
        Command::Keygen => commands::keygen().map(|out| println!("{out}")),
        Command::Sign {
            key,
            amount,
            fee,
            recipient,
            unique_id,
            expires_at,
            out,
        } => {
            let terms = openvoucher_types::VoucherTerms {
                amount,
                fee,
                recipient,
                unique_id,
                expires_at,
            };
            commands::sign(&key, terms).and_then(|json| match out {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    tracing::info!(path = %path.display(), unique_id = %unique_id, "Voucher written");
                    Ok(())
                }
                None => {
                    println!("{json}");
                    Ok(())
                }
            })
        }
        Command::Digest { voucher } => {
            commands::read_voucher(&voucher).map(|v| println!("{}", commands::digest(&v)))
        }
        Command::Verify { voucher, authority } => commands::read_voucher(&voucher)
            .and_then(|v| commands::verify(&v, authority))
            .map(|out| println!("{out}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
