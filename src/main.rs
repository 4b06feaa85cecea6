use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ppob_client::api::{Api, LoginRequest, RegisterRequest};
use ppob_client::auth::{Auth, AuthPhase};
use ppob_client::config::Config;
use ppob_client::guard::{Guard, Outcome, RouteTable};
use ppob_client::session::{CookieFile, SessionStore};
use ppob_client::wallet::Wallet;
use ppob_client::profile::ProfileUpdate;
use ppob_client::wallet::Transaction;
use ppob_client::{catalog, profile, AppState};

const USAGE: &str = "\
Usage: ppob <command>

Commands:
  register <email> <first> <last> <password>
  login <email> <password>
  logout
  profile
  balance
  topup <amount>
  services
  pay <service_code>
  history [offset limit]
  banners
  update-profile <first> <last> [image_path]
  route <path>

Configuration is taken from the environment: API_BASE_URL (required),
DATA_DIR, HTTP_TIMEOUT_SECONDS, HISTORY_PAGE_SIZE, RUST_LOG, LOG_FORMAT.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let config = Config::load()?;

    let store: Arc<dyn SessionStore> = Arc::new(CookieFile::open(&config.session.data_dir)?);
    let api = Api::new(
        &config.api.base_url,
        config.api.timeout_seconds,
        Arc::clone(&store),
    )?;
    let auth = Auth::resume(Arc::clone(&store))?;
    let guard = Guard::new(Arc::clone(&store), RouteTable::default());
    let wallet = Wallet::new(config.session.history_page_size);

    let state = AppState {
        api,
        auth,
        config,
        guard,
        store,
        wallet,
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    run(state, &args).await
}

async fn run(mut state: AppState, args: &[String]) -> anyhow::Result<()> {
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    match (command.as_str(), rest) {
        ("register", [email, first, last, password]) => {
            let request = RegisterRequest {
                email: email.clone(),
                first_name: first.clone(),
                last_name: last.clone(),
                password: password.clone(),
            };
            match state.auth.register(&state.api, &request).await? {
                AuthPhase::RegisteredOk => {
                    println!("Registration successful. You can now log in.");
                }
                AuthPhase::Failed { message } => anyhow::bail!("{message}"),
                phase => anyhow::bail!("Unexpected auth phase: {phase:?}"),
            }
        }
        ("login", [email, password]) => {
            let request = LoginRequest {
                email: email.clone(),
                password: password.clone(),
            };
            match state.auth.login(&state.api, &request).await? {
                AuthPhase::Authenticated { email } => {
                    info!(email = %email, "Session persisted");
                    println!("Logged in as {email}");
                }
                AuthPhase::Failed { message } => anyhow::bail!("{message}"),
                phase => anyhow::bail!("Unexpected auth phase: {phase:?}"),
            }
        }
        ("logout", []) => {
            state.auth.logout()?;
            println!("Logged out");
        }
        ("profile", []) => {
            let profile = profile::fetch(&state.api).await?;
            println!("{} {} <{}>", profile.first_name, profile.last_name, profile.email);
        }
        ("balance", []) => {
            let balance = state.wallet.refresh_balance(&state.api).await?;
            println!("Balance: Rp{balance}");
        }
        ("topup", [amount]) => {
            let amount: u64 = amount.parse()?;
            let balance = state.wallet.top_up(&state.api, amount).await?;
            println!("Top-up accepted. Balance: Rp{balance}");
        }
        ("services", []) => {
            for service in catalog::services(&state.api).await? {
                println!(
                    "{:<12} {:<32} Rp{}",
                    service.service_code, service.service_name, service.service_tariff
                );
            }
        }
        ("pay", [service_code]) => {
            let services = catalog::services(&state.api).await?;
            let service = catalog::find_service(&services, service_code)
                .ok_or_else(|| anyhow::anyhow!("Unknown service: {service_code}"))?;

            state.wallet.refresh_balance(&state.api).await?;
            state.wallet.pay(&state.api, service).await?;
            println!(
                "Paid Rp{} for {}",
                service.service_tariff, service.service_name
            );
        }
        ("history", []) => {
            loop {
                let fetched = state.wallet.history.load_next(&state.api).await?;
                if fetched == 0 || !state.wallet.history.has_more {
                    break;
                }
            }
            print_transactions(&state.wallet.history.records);
        }
        ("history", [offset, limit]) => {
            let offset: u32 = offset.parse()?;
            let limit: u32 = limit.parse()?;
            let records = state.api.transaction_history(offset, limit).await?;
            print_transactions(&records);
        }
        ("update-profile", [first, last]) => {
            let update = ProfileUpdate {
                first_name: first.clone(),
                last_name: last.clone(),
            };
            let profile = profile::update(&state.api, &update, None).await?;
            println!("Profile updated: {} {}", profile.first_name, profile.last_name);
        }
        ("update-profile", [first, last, image_path]) => {
            let bytes = std::fs::read(image_path)?;
            let file_name = std::path::Path::new(image_path)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid image path: {image_path}"))?;
            let content_type = match file_name.rsplit('.').next() {
                Some("png") => "image/png",
                Some("jpg") | Some("jpeg") => "image/jpeg",
                _ => "application/octet-stream",
            };

            let update = ProfileUpdate {
                first_name: first.clone(),
                last_name: last.clone(),
            };
            let profile =
                profile::update(&state.api, &update, Some((bytes, file_name, content_type)))
                    .await?;
            println!(
                "Profile updated: {} {} (image: {})",
                profile.first_name, profile.last_name, profile.profile_image
            );
        }
        ("banners", []) => {
            for banner in catalog::banners(&state.api).await? {
                println!("{}: {}", banner.banner_name, banner.description);
            }
        }
        ("route", [path]) => match state.guard.evaluate(path)? {
            Outcome::Admit { subject } => match subject {
                Some(subject) => println!("admit ({subject})"),
                None => println!("admit"),
            },
            Outcome::RedirectToPublic => {
                println!("redirect {}", state.guard.table().entry_path);
            }
            Outcome::RedirectToAuthenticatedHome => {
                println!("redirect {}", state.guard.table().home_path);
            }
        },
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_transactions(records: &[Transaction]) {
    for tx in records {
        println!(
            "{}  {:?}  Rp{}  {}",
            tx.created_on.format("%Y-%m-%d %H:%M"),
            tx.transaction_type,
            tx.total_amount,
            tx.invoice_number
        );
    }
}
