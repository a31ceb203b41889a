use anyhow::{bail, Result};
use balanced_wallet::{
    balances::BalanceStore,
    collateral::CollateralPanel,
    config::{get_address_tracker_url, get_tx_tracker_url, Config},
    currency::CurrencyKey,
    icon_rpc::IconRpc,
    ledger_sign::LedgerSignFlag,
    max_amount::available_with_reserve,
    operation_log::OperationLog,
    transaction::TransactionStore,
    user_settings::UserSettings,
    utils::is_valid_address,
    PollOutcome, TransactionTracker,
};
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage:
  balanced-wallet balances <account>
  balanced-wallet track <tx-hash>";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let settings = UserSettings::load();
    let config = Config::from_settings(&settings);
    info!("Using {} ({})", config.network_label(), config.rpc_url);

    let args: Vec<String> = std::env::args().collect();
    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("balances"), Some(account)) => show_balances(&config, account).await,
        (Some("track"), Some(hash)) => track(&config, hash).await,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

async fn show_balances(config: &Config, account: &str) -> Result<()> {
    if !is_valid_address(account) {
        bail!("Not an ICON address: {}", account);
    }
    let rpc = IconRpc::connect(config).await?;

    let store = BalanceStore::new();
    let balances = store.refresh(&rpc, account, &CurrencyKey::ALL).await?;

    println!("{} on {}", account, config.network_label());
    for currency in CurrencyKey::ALL {
        let available = available_with_reserve(currency, &balances, config.icx_reserve);
        println!(
            "  {:<6} {:>20}  (available {})",
            currency.symbol(),
            balances.get(currency).display(),
            available.display()
        );
    }

    let collateral = CollateralPanel::new(config.icx_reserve);
    let deposited = collateral.fetch_info(&rpc, account).await?;
    println!("  collateral deposited: {}", deposited.display());

    if let Some(url) = get_address_tracker_url(config.nid, account) {
        println!("{}", url);
    }
    Ok(())
}

async fn track(config: &Config, hash: &str) -> Result<()> {
    let rpc = Arc::new(IconRpc::connect(config).await?);
    let tracker = TransactionTracker::with_operation_log(
        TransactionStore::new(),
        rpc,
        LedgerSignFlag::new(),
        OperationLog::default(),
        config.nid,
    );

    tracker
        .track(hash, "Transaction pending...", "Transaction confirmed.")
        .await;
    if let Some(url) = get_tx_tracker_url(config.nid, hash) {
        println!("{}", url);
    }

    let handle = tracker.watch(config.poll_interval);
    match handle.finished().await {
        PollOutcome::Settled(status) => {
            let message = tracker
                .store()
                .get(hash)
                .await
                .map(|r| r.message().to_string())
                .unwrap_or_default();
            println!("{}: {}", status.label(), message);
            Ok(())
        }
        PollOutcome::Failed(e) => bail!("Could not track {}: {}", hash, e.user_message()),
        PollOutcome::Cancelled => bail!("Stopped tracking {} before it settled", hash),
    }
}
