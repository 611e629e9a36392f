//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_database_config, validate_web_config};
use crate::domain::emotion_score::aggregate;
use crate::domain::error::VeroTradeError;
use crate::domain::journal_stats::JournalStats;
use crate::domain::rating::VRating;
use crate::domain::stability;
use crate::domain::strategy::StrategyStats;
use crate::domain::trade::{Side, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

#[derive(Parser, Debug)]
#[command(name = "verotrade", about = "Trading journal with psychology analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the journal tables
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Journal a single trade
    Add {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        side: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        exit: f64,
        /// Realized P&L; derived from the fill prices when omitted
        #[arg(long)]
        pnl: Option<f64>,
        /// Trade date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Comma-separated emotion tags
        #[arg(long, default_value = "")]
        emotions: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        strategy: Option<i64>,
    },
    /// Import trades from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Export the journal to a CSV file
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print journal statistics and psychology scores
    Stats {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols present in the journal
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::InitDb { config } => run_init_db(&config),
        Command::Add {
            config,
            symbol,
            side,
            quantity,
            entry,
            exit,
            pnl,
            date,
            emotions,
            notes,
            strategy,
        } => run_add(
            &config, &symbol, &side, quantity, entry, exit, pnl, &date, &emotions, &notes,
            strategy,
        ),
        Command::Import { config, file } => run_import(&config, &file),
        Command::Export { config, output } => run_export(&config, &output),
        Command::Stats { config } => run_stats(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::CheckConfig { config } => run_check_config(&config),
        Command::Serve { config } => run_serve(&config),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = VeroTradeError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// The whole journal; the port filters by trade date.
fn journal_range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2100, 12, 31).expect("valid date"),
    )
}

/// Open the configured journal backend: Postgres when a connection string is
/// configured and compiled in, SQLite otherwise.
fn open_journal(config: &dyn ConfigPort) -> Result<Box<dyn JournalPort>, VeroTradeError> {
    #[cfg(feature = "postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        if config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .is_some()
        {
            return Ok(Box::new(PostgresAdapter::from_config(config)?));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        if config.get_string("sqlite", "path").is_some() {
            return Ok(Box::new(SqliteAdapter::from_config(config)?));
        }
    }

    let _ = config;
    Err(VeroTradeError::ConfigMissing {
        section: "sqlite".into(),
        key: "path".into(),
    })
}

/// Same backend selection as [`open_journal`], shareable across the web
/// server's worker threads.
#[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
fn open_shared_journal(
    config: &dyn ConfigPort,
) -> Result<std::sync::Arc<dyn JournalPort + Send + Sync>, VeroTradeError> {
    #[cfg(feature = "web-postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        if config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .is_some()
        {
            return Ok(std::sync::Arc::new(PostgresAdapter::from_config(config)?));
        }
    }

    #[cfg(feature = "web-sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        Ok(std::sync::Arc::new(SqliteAdapter::from_config(config)?))
    }

    #[cfg(not(feature = "web-sqlite"))]
    {
        Err(VeroTradeError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        })
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_database_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    #[cfg(feature = "postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        if config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .is_some()
        {
            let adapter = match PostgresAdapter::from_config(&config) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            if let Err(e) = adapter.initialize_schema() {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("Journal schema initialized (postgres)");
            return ExitCode::SUCCESS;
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let adapter = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = adapter.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Journal schema initialized (sqlite)");
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        eprintln!("error: no storage backend compiled in");
        ExitCode::from(1)
    }
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    config_path: &PathBuf,
    symbol: &str,
    side: &str,
    quantity: f64,
    entry: f64,
    exit: f64,
    pnl: Option<f64>,
    date: &str,
    emotions: &str,
    notes: &str,
    strategy: Option<i64>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let side = match Side::parse(side) {
        Some(s) => s,
        None => {
            eprintln!("error: side must be buy or sell");
            return ExitCode::from(4);
        }
    };

    let trade_date = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            eprintln!("error: invalid date format (expected YYYY-MM-DD)");
            return ExitCode::from(4);
        }
    };

    let pnl = pnl.unwrap_or_else(|| match side {
        Side::Buy => (exit - entry) * quantity,
        Side::Sell => (entry - exit) * quantity,
    });

    let trade = Trade {
        id: None,
        symbol: symbol.trim().to_uppercase(),
        side,
        quantity,
        entry_price: entry,
        exit_price: exit,
        pnl,
        trade_date,
        emotions: emotions
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        strategy_id: strategy,
        notes: notes.to_string(),
    };

    let journal = match open_journal(&config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(strategy_id) = strategy {
        let known = journal
            .list_strategies()
            .map(|all| all.iter().any(|s| s.id == Some(strategy_id)))
            .unwrap_or(false);
        if !known {
            let err = VeroTradeError::UnknownStrategy { id: strategy_id };
            eprintln!("error: {err}");
            return (&err).into();
        }
    }

    match journal.insert_trade(&trade) {
        Ok(id) => {
            eprintln!("Journaled trade #{id}: {} {}", trade.symbol, trade.pnl);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_import(config_path: &PathBuf, file: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("Importing trades from {}", file.display());
    let trades = match csv_adapter::import_trades(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let journal = match open_journal(&config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut imported = 0usize;
    for trade in &trades {
        match journal.insert_trade(trade) {
            Ok(_) => imported += 1,
            Err(e) => {
                eprintln!("warning: skipping {} on {} ({})", trade.symbol, trade.trade_date, e);
            }
        }
    }

    eprintln!("Imported {imported} of {} trades", trades.len());
    ExitCode::SUCCESS
}

fn run_export(config_path: &PathBuf, output: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let journal = match open_journal(&config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (start, end) = journal_range();
    let trades = match journal.fetch_trades(start, end) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Err(e) = csv_adapter::export_trades(output, &trades) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Exported {} trades to {}", trades.len(), output.display());
    ExitCode::SUCCESS
}

fn run_stats(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let journal = match open_journal(&config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (start, end) = journal_range();
    let trades = match journal.fetch_trades(start, end) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let stats = JournalStats::compute(&trades);
    let distribution = aggregate(&trades);
    let score = stability::score(&distribution);
    let rating = VRating::compute(&trades, &stats, &score);

    println!("=== Journal ===");
    println!("Total Trades:     {}", stats.total_trades);
    println!(
        "Wins/Losses/Flat: {}/{}/{}",
        stats.wins, stats.losses, stats.breakeven
    );
    println!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
    if stats.profit_factor.is_infinite() {
        println!("Profit Factor:    inf");
    } else {
        println!("Profit Factor:    {:.2}", stats.profit_factor);
    }
    println!("Total P&L:        {:+.2}", stats.total_pnl);
    println!("Expectancy:       {:+.2}", stats.expectancy);

    println!("\n=== Psychology ===");
    println!("Stability Index:  {:.2}", score.stability_index);
    println!("Discipline Level: {:.2}", score.discipline_level);
    println!("Tilt Control:     {:.2}", score.tilt_control);

    if !distribution.is_empty() {
        println!("\n=== Emotions ===");
        for bucket in &distribution {
            println!(
                "  {:<12} {:>3}x  {:>5.1}%",
                bucket.tag, bucket.count, bucket.share_pct
            );
        }
    }

    println!("\n=== V-Rating ===");
    println!("Overall:          {:.1}", rating.overall);
    println!("  Profitability:  {:.1}", rating.profitability);
    println!("  Risk:           {:.1}", rating.risk_management);
    println!("  Consistency:    {:.1}", rating.consistency);
    println!("  Emotional:      {:.1}", rating.emotional_discipline);
    println!("  Journaling:     {:.1}", rating.journaling);

    if let Ok(strategies) = journal.list_strategies() {
        if !strategies.is_empty() {
            println!("\n=== Strategies ===");
            for strategy in &strategies {
                let Some(id) = strategy.id else { continue };
                let trades = journal.fetch_trades_for_strategy(id).unwrap_or_default();
                let checks = journal.fetch_rule_checks(id).unwrap_or_default();
                let sstats = StrategyStats::compute(strategy, &trades, &checks);
                println!(
                    "  {}: {} trades, {} wins, {:+.2} P&L, {:.0}% compliance",
                    strategy.name,
                    sstats.trades_taken,
                    sstats.wins,
                    sstats.total_pnl,
                    sstats.avg_compliance * 100.0,
                );
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let journal = match open_journal(&config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = match journal.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols in the journal");
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_check_config(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_database_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // The web sections are only required when serving.
    if config.get_string("auth", "username").is_some()
        || config.get_string("web", "listen").is_some()
    {
        if let Err(e) = validate_web_config(&config) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Web config valid");
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
    {
        use crate::adapters::web::build_router;
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        if let Err(e) = validate_database_config(&config) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        if let Err(e) = validate_web_config(&config) {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let journal = match open_shared_journal(&config) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:3000".parse().expect("valid default addr"));

        eprintln!("Starting web server on {addr}");

        let state = crate::adapters::web::AppState {
            journal,
            config: Arc::new(config),
        };

        let router = match build_router(state) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };

        runtime.block_on(async {
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("error: failed to bind {addr}: {e}");
                    return ExitCode::from(1);
                }
            };
            if let Err(e) = axum::serve(listener, router).await {
                eprintln!("error: server exited: {e}");
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        })
    }

    #[cfg(not(any(feature = "web-sqlite", feature = "web-postgres")))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_hash_password() -> ExitCode {
    #[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
    {
        use argon2::{
            password_hash::SaltString, Algorithm, Argon2, Params, PasswordHasher, Version,
        };
        use rand::rngs::OsRng;
        use std::io::{self, BufRead};

        eprintln!("Enter password to hash:");
        let stdin = io::stdin();
        let password = match stdin.lock().lines().next() {
            Some(Ok(line)) => line,
            _ => String::new(),
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        match argon2.hash_password(password.as_bytes(), &salt) {
            Ok(hash) => {
                println!("{hash}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to hash password: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(any(feature = "web-sqlite", feature = "web-postgres")))]
    {
        eprintln!("error: web feature is required for hash-password");
        ExitCode::from(1)
    }
}
