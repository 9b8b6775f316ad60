use anyhow::Context;
use aptkit::{keys::KeyDeriver, Account, AppConfig, AptClient};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

/// Environment variable read before prompting for a credential
const KEY_ENV: &str = "APTKIT_KEY";

#[derive(Parser)]
#[command(name = "aptkit")]
#[command(about = "Account and transaction tool for Aptos nodes")]
struct Cli {
    /// Override the configured node URL
    #[arg(long, global = true)]
    node: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh account and print its address and exported key
    New,
    /// Derive an account from a mnemonic or private key
    Derive {
        /// BIP44 account index for mnemonics
        #[arg(long, default_value_t = 0)]
        index: i64,
    },
    /// Show the native coin balance of an address
    Balance { address: String },
    /// Transfer coins from the derived account
    Transfer {
        #[arg(long)]
        to: String,
        /// Amount in octas
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value_t = 0)]
        index: i64,
        /// Wait until the transaction is final
        #[arg(long)]
        wait: bool,
    },
    /// Simulate a transfer without submitting it
    Simulate {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value_t = 0)]
        index: i64,
    },
    /// Look up a transaction by hash
    Tx {
        #[arg(long)]
        hash: String,
    },
}

fn read_credential() -> anyhow::Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(KEY_ENV) {
        return Ok(Zeroizing::new(value));
    }
    let value = rpassword::read_password_from_tty(Some("Mnemonic or private key: "))
        .context("failed to read credential")?;
    Ok(Zeroizing::new(value))
}

fn load_account(index: i64) -> anyhow::Result<Account> {
    let credential = read_credential()?;
    let deriver = KeyDeriver::classify(&credential);
    info!(credential = deriver.credential().kind(), index, "Deriving account");
    Ok(deriver.derive_account(index)?)
}

fn load_config(node: Option<String>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(url) = node {
        config.node.url = url;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aptkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::New => {
            let account = Account::generate();
            println!("address:     {}", account.address());
            println!("public key:  {}", account.public_key_hex());
            println!("private key: {}", account.private_key_base58().as_str());
        }
        Commands::Derive { index } => {
            let account = load_account(index)?;
            println!("address:     {}", account.address());
            println!("auth key:    {}", account.authentication_key());
            println!("public key:  {}", account.public_key_hex());
        }
        Commands::Balance { address } => {
            let client = AptClient::from_config(&load_config(cli.node)?)?;
            let balance = client.balance(&address).await?;
            println!("{balance}");
        }
        Commands::Transfer {
            to,
            amount,
            index,
            wait,
        } => {
            let client = AptClient::from_config(&load_config(cli.node)?)?;
            let account = load_account(index)?;
            let pending = client.transfer(&account, &to, amount).await?;
            println!("{}", pending.hash);

            if wait {
                let success = client.wait_for_transaction(&pending.hash).await?;
                println!("success: {success}");
                if !success {
                    anyhow::bail!("transaction {} failed on chain", pending.hash);
                }
            }
        }
        Commands::Simulate { to, amount, index } => {
            let client = AptClient::from_config(&load_config(cli.node)?)?;
            let account = load_account(index)?;
            let sender = account.address();
            let receiver: aptkit::AccountAddress = to.parse()?;
            let sequence_number = client.sequence_number(&sender.to_string()).await?;

            let transaction = client
                .transaction_builder(sender)
                .sequence_number(sequence_number)
                .payload(aptkit::transaction::coin_transfer(&receiver, amount))
                .build();
            let signed = client.sign_transaction(&account, &transaction).await?;
            let records = client.simulate(&signed).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Tx { hash } => {
            let client = AptClient::from_config(&load_config(cli.node)?)?;
            let record = client.transaction_by_hash(&hash).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
