use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::path::{
    Path,
    PathBuf,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: lucky-grid [--data-dir <path>] [--config <path>] [--catalog <path>]\n\
         [--wallet <address>] [--funds <units>]\n\
         \n\
         Flags:\n\
           --data-dir <path>   Where spend, history and logs are kept (default {})\n\
           --config <path>     JSON game settings (price, threshold, timings, messages)\n\
           --catalog <path>    JSON array of prizes replacing the built-in grid\n\
           --wallet <address>  Account reported when connecting (none: connect fails)\n\
           --funds <units>     Local balance tickets are paid from (default {})",
        lucky_grid::store::DEFAULT_DATA_DIR,
        client::DEFAULT_FUNDS,
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut data_dir: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut catalog_path: Option<String> = None;
    let mut wallet: Option<String> = None;
    let mut funds: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--data-dir requires a path argument"))?;
                if data_dir.is_some() {
                    return Err(eyre!("--data-dir may only be specified once"));
                }
                data_dir = Some(dir);
            }
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--config requires a path argument"))?;
                if config_path.is_some() {
                    return Err(eyre!("--config may only be specified once"));
                }
                config_path = Some(path);
            }
            "--catalog" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--catalog requires a path argument"))?;
                if catalog_path.is_some() {
                    return Err(eyre!("--catalog may only be specified once"));
                }
                catalog_path = Some(path);
            }
            "--wallet" => {
                let address = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires an address"))?;
                if wallet.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                wallet = Some(address);
            }
            "--funds" => {
                let raw = args
                    .next()
                    .ok_or_else(|| eyre!("--funds requires an amount"))?;
                let amount = raw
                    .parse::<u64>()
                    .wrap_err_with(|| format!("--funds expects a whole number, got {raw:?}"))?;
                funds = Some(amount);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let expand = |raw: String| PathBuf::from(shellexpand::tilde(&raw).into_owned());
    Ok(client::AppConfig {
        data_dir: expand(
            data_dir.unwrap_or_else(|| lucky_grid::store::DEFAULT_DATA_DIR.to_string()),
        ),
        config_path: config_path.map(expand),
        catalog_path: catalog_path.map(expand),
        wallet,
        funds: funds.unwrap_or(client::DEFAULT_FUNDS),
    })
}

/// Logs go to a daily file so they never draw over the terminal UI.
fn init_tracing(data_dir: &Path) -> Result<WorkerGuard> {
    let appender = rolling::daily(data_dir.join("logs"), "lucky-grid.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install log subscriber: {e}"))?;
    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = parse_cli_args()?;
    let _log_guard = init_tracing(&app_config.data_dir)?;
    tracing::info!(data_dir = %app_config.data_dir.display(), "starting lucky-grid");
    client::run_app(app_config).await
}
