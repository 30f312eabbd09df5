use clap::Parser;
use env_logger::Env;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "authboot", version, about = "Bootstrap the authorization store")]
pub struct Cli {
    /// Path to the service configuration YAML; built-in defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store location (JSON snapshot path, or `memory`); overrides the config file
    #[arg(long)]
    pub store: Option<String>,

    /// Proceed even if the store holds data without a version marker
    #[arg(long = "no-db-check")]
    pub no_db_check: bool,

    /// Print the probe result and the planned action as JSON, then exit without writing
    #[arg(long)]
    pub inspect: bool,

    /// env_logger-style filter string (e.g. "info,authboot=debug"); overrides RUST_LOG/defaults
    #[arg(long)]
    pub log_filter: Option<String>,
}

pub const DEFAULT_LOG_FILTER: &str = "info,authboot=info";
pub const NO_DB_CHECK_FLAG: &str = "--no-db-check";

pub fn init_logging(cli_filter: Option<&str>) {
    let env = Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(filter) = cli_filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp_secs();
    builder.format(|buf, record| {
        let ts = buf.timestamp();
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            ts,
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();
}
