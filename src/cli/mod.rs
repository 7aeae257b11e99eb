use clap::{Parser, Subcommand};
use crate::client::{ClientParams, FeeEstimator, TONCENTER_V2_URL, ToncenterV2Client};
use crate::message::{DEFAULT_AMOUNT, build_transaction_cell, create_transaction_body, transfer_comment};
use crate::tvm::{Address, boc_to_hex};
use crate::wallet::{EnvFile, Wallet, load_or_create};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// tonfee CLI
#[derive(Parser, Debug)]
#[command(name = "tonfee")]
#[command(about = "Estimate TON transfer fees for a snake-encoded message body", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the fee of a message sent to the stored wallet
    Estimate {
        /// Wallet file, created with a new mnemonic when missing
        #[arg(short = 'e', long, default_value = ".env")]
        env_file: PathBuf,
        /// Amount written into the body
        #[arg(short = 'a', long, default_value = DEFAULT_AMOUNT)]
        amount: String,
        /// Message text, defaults to a comment addressed to the wallet
        #[arg(short = 'm', long)]
        message: Option<String>,
        /// API base URL
        #[arg(long, default_value = TONCENTER_V2_URL)]
        base_url: String,
        #[arg(long, env = "TONCENTER_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Request timeout in seconds
        #[arg(short = 't', long, default_value = "10")]
        timeout: u64,
        /// Retries on transient failures
        #[arg(short = 'r', long, default_value = "2")]
        retries: u64,
        /// Proxy URI (http, https, socks4, socks5)
        #[arg(long, env = "TONFEE_PROXY")]
        proxy: Option<String>,
        /// Send the address in user-friendly form instead of bare hex
        #[arg(long)]
        friendly: bool,
    },
    /// Print the encoded message body without contacting the network
    Body {
        /// Destination address written into the comment
        #[arg(short = 'd', long)]
        address: String,
        #[arg(short = 'a', long, default_value = DEFAULT_AMOUNT)]
        amount: String,
        #[arg(short = 'm', long)]
        message: Option<String>,
        /// Print hex instead of base64
        #[arg(long)]
        hex: bool,
    },
    /// Show the stored wallet, or create one
    Wallet {
        #[arg(short = 'e', long, default_value = ".env")]
        env_file: PathBuf,
        /// Create the wallet file if it does not exist
        #[arg(long)]
        create: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Estimate {
                env_file,
                amount,
                message,
                base_url,
                api_key,
                timeout,
                retries,
                proxy,
                friendly,
            } => {
                let params = ClientParams {
                    timeout: Some(*timeout),
                    api_key: api_key.clone(),
                    base_url: Some(base_url.clone()),
                    proxy: proxy.clone(),
                    max_retries: Some(*retries),
                    ..ClientParams::default()
                };
                self.execute_estimate(env_file, amount, message.as_deref(), params, *friendly)
                    .await
            }
            Commands::Body {
                address,
                amount,
                message,
                hex,
            } => self.execute_body(address, amount, message.as_deref(), *hex),
            Commands::Wallet { env_file, create } => self.execute_wallet(env_file, *create),
        }
    }

    async fn execute_estimate(
        &self,
        env_file: &Path,
        amount: &str,
        message: Option<&str>,
        params: ClientParams,
        friendly: bool,
    ) -> Result<()> {
        let (wallet_address, created) = load_or_create(env_file)?;
        if created.is_some() {
            log::info!("New mnemonic stored in {}", env_file.display());
        }

        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| transfer_comment(&wallet_address));
        let body = create_transaction_body(&message, amount)?;
        log::debug!("Transaction body: {}", body);

        let address = if friendly {
            Address::from_hex(&wallet_address)?.to_base64()
        } else {
            wallet_address
        };

        let client = ToncenterV2Client::new(Some(params))?;
        let op_start = Instant::now();
        let fee = client.estimate_fee(&address, &body).await?;
        log::info!("⏱️  estimateFee: {:.3}s", op_start.elapsed().as_secs_f64());

        println!("Estimated fee: {} TON", fee);
        Ok(())
    }

    fn execute_body(&self, address: &str, amount: &str, message: Option<&str>, hex: bool) -> Result<()> {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| transfer_comment(address));

        let encoded = if hex {
            boc_to_hex(&build_transaction_cell(&message, amount)?, true)?
        } else {
            create_transaction_body(&message, amount)?
        };

        println!("{}", encoded);
        Ok(())
    }

    fn execute_wallet(&self, env_file: &Path, create: bool) -> Result<()> {
        if !env_file.exists() && !create {
            bail!("{} does not exist, pass --create to generate a wallet", env_file.display());
        }

        let (address, _) = load_or_create(env_file)?;
        println!("Wallet address: {}", address);
        if !env_file.exists() {
            return Ok(());
        }

        let env = EnvFile::read(env_file)?;
        if let Some(mnemonic) = env.get(crate::wallet::env_file::MNEMONIC_KEY) {
            let wallet = Wallet::from_mnemonic(mnemonic)
                .with_context(|| format!("Invalid mnemonic in {}", env_file.display()))?;
            println!("Raw address:    {}", wallet.address().to_raw());
            println!("User-friendly:  {}", wallet.address());
            println!("Public key:     {}", wallet.public_key_hex());
        }
        Ok(())
    }
}
