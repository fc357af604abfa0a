//! Fee Sentinel CLI
//!
//! Command-line front end for the asset-management API:
//! - Sign in, register, sign out
//! - Browse portfolios and their fee anomalies
//! - Trigger anomaly detection
//! - Test OCR extraction of statement PDFs

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fee_sentinel::client::{ApiClient, ClientError, PortfolioService};
use fee_sentinel::config::{generate_default_config, Config};
use fee_sentinel::render::{self, OutputFormat};
use fee_sentinel::session::{FileSessionStore, SessionManager};
use fee_sentinel::views::{Dashboard, LoginForm, RegisterForm, UploadTarget, UploadTester};

#[derive(Parser)]
#[command(name = "fee-sentinel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Asset-management fee anomaly dashboard")]
#[command(long_about = "Fee Sentinel talks to the asset-management API.\nSign in, browse portfolios, run anomaly detection and test statement OCR.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Session file (overrides config)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(short, long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Password confirmation (read from stdin when omitted)
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Ask the server instead of reading the stored profile
        #[arg(long)]
        remote: bool,
    },

    /// List portfolios
    Portfolios,

    /// Show anomalies of a portfolio
    Anomalies {
        /// Portfolio ID
        portfolio_id: i64,
    },

    /// Run anomaly detection for a portfolio
    Detect {
        /// Portfolio ID
        portfolio_id: i64,
    },

    /// Portfolio overview; select one to see its anomalies
    Dashboard {
        /// Portfolio to select
        #[arg(short, long)]
        portfolio: Option<i64>,
        /// Run detection on the selected portfolio first
        #[arg(long, requires = "portfolio")]
        detect: bool,
    },

    /// Send a statement PDF to the OCR extraction service
    Upload {
        /// Path to the PDF
        path: PathBuf,
        /// Deployment to use (local, hosted)
        #[arg(short, long)]
        target: Option<UploadTarget>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(path) = &cli.session_file {
        config.session.file = path.to_string_lossy().to_string();
    }

    fee_sentinel::logging::init(&config.logging);

    let store = Arc::new(FileSessionStore::new(&config.session.file));
    let session = Arc::new(SessionManager::restore(store));
    let client = ApiClient::new(&config.api.client_config(), Arc::clone(&session))?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };

            let mut form = LoginForm::new(email, password);
            match form.submit(&client).await {
                Some(session) => println!("Signed in as {}", session.user.display_name()),
                None => fail(form.error().unwrap_or("Login failed")),
            }
        }

        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let confirm_password = match confirm_password {
                Some(p) => p,
                None => prompt("Confirm password: ")?,
            };

            let mut form = RegisterForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                ..Default::default()
            };
            match form.submit(&client).await {
                Some(response) => {
                    println!("{}", response.message);
                    println!("Sign in with: fee-sentinel login --email {}", form.email.trim());
                }
                None => fail(form.error().unwrap_or("Registration failed")),
            }
        }

        Commands::Logout => {
            client.logout()?;
            println!("Signed out");
        }

        Commands::Whoami { remote } => {
            let user = if remote {
                Some(client.current_user().await.unwrap_or_else(|e| exit_on(e)))
            } else {
                session.current_user()
            };

            match user {
                Some(user) => match cli.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
                    _ => println!("{} <{}> (id {})", user.display_name(), user.email, user.id),
                },
                None => fail("Not signed in"),
            }
        }

        Commands::Portfolios => {
            let portfolios = client.portfolios().await.unwrap_or_else(|e| exit_on(e));
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&portfolios)?),
                OutputFormat::Csv => print!("{}", render::portfolios_csv(&portfolios)?),
                OutputFormat::Table => print!("{}", render::portfolio_table(&portfolios)),
            }
        }

        Commands::Anomalies { portfolio_id } => {
            let anomalies = client
                .anomalies(portfolio_id)
                .await
                .unwrap_or_else(|e| exit_on(e));
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&anomalies)?),
                OutputFormat::Csv => print!("{}", render::anomalies_csv(&anomalies)?),
                OutputFormat::Table => print!("{}", render::anomaly_table(&anomalies)),
            }
        }

        Commands::Detect { portfolio_id } => {
            let summary = client
                .detect_anomalies(portfolio_id)
                .await
                .unwrap_or_else(|e| exit_on(e));
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                _ => print!("{}", render::detection_summary(&summary)),
            }
        }

        Commands::Dashboard { portfolio, detect } => {
            run_dashboard(client, portfolio, detect, cli.format).await?;
        }

        Commands::Upload { path, target } => {
            let target = target.unwrap_or_else(|| config.upload.target());
            run_upload(client, &config, &path, target, cli.format).await?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }
    }

    Ok(())
}

async fn run_dashboard(
    client: ApiClient,
    portfolio: Option<i64>,
    detect: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::new(client);

    dashboard.load_portfolios().await;
    check(&dashboard);

    if let Some(id) = portfolio {
        dashboard.select(id).await;
        check(&dashboard);

        if detect {
            eprintln!("Detecting...");
            dashboard.run_detection().await;
            check(&dashboard);
        }
    }

    if format == OutputFormat::Json {
        let view = serde_json::json!({
            "portfolios": dashboard.portfolios(),
            "selected": dashboard.selected(),
            "anomalies": dashboard.anomalies(),
            "detection": dashboard.last_detection(),
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Asset Management Anomaly Detection");
    println!();
    print!("{}", render::portfolio_table(dashboard.portfolios()));

    if let Some(selected) = dashboard.selected() {
        println!();
        print!("{}", render::portfolio_header(selected));
        if let Some(summary) = dashboard.last_detection() {
            println!();
            print!("{}", render::detection_summary(summary));
        }
        println!();
        match format {
            OutputFormat::Csv => print!("{}", render::anomalies_csv(dashboard.anomalies())?),
            _ => print!("{}", render::anomaly_table(dashboard.anomalies())),
        }
    } else {
        println!();
        println!("Select a portfolio with: fee-sentinel dashboard --portfolio <ID>");
    }

    Ok(())
}

async fn run_upload(
    client: ApiClient,
    config: &Config,
    path: &Path,
    target: UploadTarget,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut tester = UploadTester::new(client, config.upload.endpoints(), target);

    if let Err(e) = tester.select_path(path) {
        fail(&e.to_string());
    }

    eprintln!("Uploading to {} ({})", tester.endpoint(), tester.target());
    if target == UploadTarget::Hosted {
        eprintln!("Note: the first hosted request may take 30-60 seconds (cold start)");
    }

    let response = tester
        .submit()
        .await
        .context("no file selected for upload")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        _ => print!("{}", render::extraction_report(response)),
    }

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Stop on a dashboard error, pointing at `login` when the session is gone
fn check<S: PortfolioService>(dashboard: &Dashboard<S>) {
    if dashboard.needs_login() {
        session_expired();
    }
    if let Some(error) = dashboard.error() {
        fail(error);
    }
}

fn exit_on(e: ClientError) -> ! {
    if e.is_unauthorized() {
        session_expired();
    }
    fail(&e.to_string())
}

fn session_expired() -> ! {
    eprintln!("Session expired or missing. Sign in with:");
    eprintln!("  fee-sentinel login --email <EMAIL>");
    std::process::exit(1);
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
