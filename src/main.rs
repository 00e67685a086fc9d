use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shagun::config::Settings;
use shagun::handlers::events::{Dashboard, EventQuery, SortBy};
use shagun::models::contribution::Relation;
use shagun::requests::auth::LoginRequest;
use shagun::requests::contribution::{ContributionRequest, PaymentMethod};
use shagun::requests::event::{CreateEventRequest, UpdateEventRequest};
use shagun::services::auth::AuthService;
use shagun::services::contributions::ContributionsApi;
use shagun::services::events::EventsApi;
use shagun::services::gateway::Gateway;
use shagun::services::session::{
    AuthSession, LoggingNavigator, Navigator, SecureTokenProvider, TokenSession,
};
use shagun::services::upi::{Platform, build_payment_uri, default_apps};
use shagun::utils::helpers::{format_event_date, format_inr};

#[derive(Parser)]
#[command(name = "shagun", about = "Manage wedding shagun collections")]
struct Cli {
    #[arg(long, global = true, env = "SHAGUN_EMAIL")]
    email: Option<String>,
    #[arg(long, global = true, env = "SHAGUN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List your events
    Events {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "date", value_parser = parse_sort)]
        sort: SortBy,
    },
    /// Show an event with its contributions
    Event { id: String },
    CreateEvent {
        #[arg(long)]
        bride: String,
        #[arg(long)]
        groom: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        upi_id: String,
        #[arg(long)]
        occasion: Option<String>,
    },
    UpdateEvent {
        id: String,
        #[arg(long)]
        bride: Option<String>,
        #[arg(long)]
        groom: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        upi_id: Option<String>,
    },
    DeleteEvent { id: String },
    /// Print the UPI launch links a guest would be handed
    UpiLink {
        event_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "bride", value_parser = parse_relation)]
        relation: Relation,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Record a cash gift as the host
    Record {
        event_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "bride", value_parser = parse_relation)]
        relation: Relation,
        #[arg(long, default_value = "")]
        message: String,
    },
}

fn parse_sort(raw: &str) -> Result<SortBy, String> {
    raw.parse()
        .map_err(|_| format!("unknown sort {raw:?}, expected date or amount"))
}

fn parse_relation(raw: &str) -> Result<Relation, String> {
    raw.parse()
        .map_err(|_| format!("unknown relation {raw:?}, expected bride or groom"))
}

struct App {
    settings: Settings,
    session: Arc<TokenSession<SecureTokenProvider>>,
    navigator: Arc<dyn Navigator>,
    gateway: Arc<Gateway>,
}

impl App {
    fn new(settings: Settings) -> Result<Self> {
        let provider_client = Client::builder()
            .timeout(settings.api.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let session = Arc::new(TokenSession::new(SecureTokenProvider::new(
            provider_client,
            &settings.auth,
        )));
        let navigator: Arc<dyn Navigator> = Arc::new(LoggingNavigator);
        let auth_session: Arc<dyn AuthSession> = session.clone();
        let gateway = Arc::new(Gateway::new(
            &settings.api,
            &settings.app,
            auth_session,
            Arc::clone(&navigator),
        )?);

        Ok(Self {
            settings,
            session,
            navigator,
            gateway,
        })
    }

    fn auth(&self) -> AuthService<SecureTokenProvider> {
        AuthService::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.session),
            Arc::clone(&self.navigator),
            &self.settings.auth,
            &self.settings.app,
        )
    }

    async fn sign_in(&self, cli: &Cli) -> Result<()> {
        let (Some(email), Some(password)) = (&cli.email, &cli.password) else {
            bail!("--email and --password (or SHAGUN_EMAIL / SHAGUN_PASSWORD) are required");
        };
        self.auth()
            .sign_in(&LoginRequest {
                email: email.clone(),
                password: password.clone(),
            })
            .await
            .map_err(|e| anyhow!("{}: {}", e.user_message(), e))?;
        Ok(())
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(
            EventsApi::new(Arc::clone(&self.gateway)),
            ContributionsApi::new(Arc::clone(&self.gateway)),
            &self.settings.app.share_base_url,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let app = App::new(settings)?;

    match &cli.command {
        Command::UpiLink {
            event_id,
            name,
            amount,
            relation,
            message,
        } => {
            app.session.mark_unauthenticated().await;
            let event = EventsApi::new(Arc::clone(&app.gateway))
                .get_public(event_id)
                .await?;
            let contribution = ContributionRequest {
                name: name.clone(),
                amount: amount.clone(),
                relation: *relation,
                message: message.clone(),
                method: PaymentMethod::Upi,
            }
            .validate(&event.id)?;
            let request = build_payment_uri(&event, &contribution)?;

            println!("{} for {}", format_inr(request.amount), event.couple());
            println!("Transaction: {}", request.transaction_id);
            println!("Generic: {}", request.uri);
            for platform in [Platform::Android, Platform::Ios] {
                println!("\n{platform:?}");
                for app in default_apps() {
                    for uri in app.launch_sequence(platform, &request) {
                        println!("  {:<16} {}", app.name, uri);
                    }
                }
            }
            return Ok(());
        }
        _ => app.sign_in(&cli).await?,
    }

    let dashboard = app.dashboard();
    let outcome = run(&app, &dashboard, &cli.command).await;
    app.auth().logout().await;
    outcome
}

async fn run(app: &App, dashboard: &Dashboard, command: &Command) -> Result<()> {
    match command {
        Command::Events { search, sort } => {
            let query = EventQuery {
                search: search.clone(),
                sort_by: *sort,
            };
            let events = dashboard.events(&query).await?;
            if events.is_empty() {
                println!("No events found");
            }
            for event in events {
                println!(
                    "{}  {:<28} {:>12}  {}",
                    format_event_date(event.event_date),
                    event.couple(),
                    format_inr(event.total_amount.unwrap_or_default()),
                    event.id
                );
            }
        }
        Command::Event { id } => {
            let details = dashboard.details(id).await?;
            println!(
                "{} ({}) on {}",
                details.event.couple(),
                details.event.occasion_type,
                format_event_date(details.event.event_date)
            );
            println!("UPI: {}", details.event.upi_id);
            println!("Share: {}", dashboard.share_url(&details.event.id));
            println!(
                "Total {} from {} guests (bride side {}, groom side {})",
                format_inr(details.summary.total),
                details.summary.count,
                format_inr(details.summary.bride_side),
                format_inr(details.summary.groom_side)
            );
            for contribution in details.contributions {
                println!(
                    "  {:<24} {:>10}  {}",
                    contribution.name,
                    format_inr(contribution.amount),
                    contribution.relation
                );
            }
        }
        Command::CreateEvent {
            bride,
            groom,
            date,
            upi_id,
            occasion,
        } => {
            let created = dashboard
                .create(&CreateEventRequest {
                    occasion_type: occasion.clone(),
                    bride_name: bride.clone(),
                    groom_name: groom.clone(),
                    event_date: date.clone(),
                    upi_id: upi_id.clone(),
                })
                .await?;
            match created.id {
                Some(id) => println!("Created event {}\nShare: {}", id, dashboard.share_url(&id)),
                None => println!("Event created"),
            }
        }
        Command::UpdateEvent {
            id,
            bride,
            groom,
            date,
            upi_id,
        } => {
            let update = UpdateEventRequest {
                occasion_type: None,
                bride_name: bride.clone(),
                groom_name: groom.clone(),
                event_date: date.clone(),
                upi_id: upi_id.clone(),
            }
            .validate()?;
            EventsApi::new(Arc::clone(&app.gateway))
                .update(id, &update)
                .await?;
            println!("Updated event {id}");
        }
        Command::DeleteEvent { id } => {
            EventsApi::new(Arc::clone(&app.gateway)).delete(id).await?;
            println!("Deleted event {id}");
        }
        Command::Record {
            event_id,
            name,
            amount,
            relation,
            message,
        } => {
            let contribution = ContributionRequest {
                name: name.clone(),
                amount: amount.clone(),
                relation: *relation,
                message: message.clone(),
                method: PaymentMethod::Cash,
            }
            .validate(event_id)?;
            ContributionsApi::new(Arc::clone(&app.gateway))
                .create(&contribution)
                .await?;
            println!("Recorded {} from {}", format_inr(contribution.amount), contribution.name);
        }
        Command::UpiLink { .. } => {}
    }
    Ok(())
}
