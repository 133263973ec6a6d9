//! Incident Co-Pilot - Binary Entry Point
//!
//! `copilot watch` follows the push channel and prints each dashboard
//! refresh; the other subcommands are one-shot REST calls.

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;

use incident_copilot::channel::{UpdateChannel, WsConnector};
use incident_copilot::config::{parse_api_url, parse_channel_url, Config};
use incident_copilot::dashboard::{DashboardFeed, DashboardSnapshot, FeedOptions, IncidentView};
use incident_copilot::types::{Incident, IncidentStatus, Severity};
use incident_copilot::utils::{format_age, format_minutes};
use incident_copilot::{ApiClient, IncidentQuery};

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "copilot", version, about = "Incident co-pilot dashboard client")]
struct Cli {
    /// REST base address (overrides COPILOT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Push channel address (overrides COPILOT_WS_URL)
    #[arg(long, global = true)]
    ws_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Follow real-time updates and print the dashboard on every change
    Watch,
    /// List incidents
    Incidents {
        #[arg(long)]
        status: Option<IncidentStatus>,
        #[arg(long)]
        severity: Option<Severity>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Client-side view: all, active, resolved or a severity
        #[arg(long, default_value = "all")]
        view: IncidentView,
    },
    /// Show one incident with its action history
    Show { id: i64 },
    /// Update an incident's status
    SetStatus { id: i64, status: IncidentStatus },
    /// Print aggregate statistics
    Stats,
    /// Print mean time to resolution
    Mttr {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = parse_api_url(url)?;
    }
    if let Some(url) = &cli.ws_url {
        config.channel_url = parse_channel_url(url)?;
    }

    let api = ApiClient::from_config(&config)?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&config, api).await,
        Command::Incidents {
            status,
            severity,
            service,
            limit,
            offset,
            view,
        } => {
            let query = IncidentQuery {
                status,
                severity,
                service,
                limit: Some(limit),
                offset: Some(offset),
            };
            let incidents = api.list_incidents(&query).await?;
            for incident in view.apply(&incidents) {
                print_incident_line(incident);
            }
            Ok(())
        }
        Command::Show { id } => {
            let incident = api.get_incident(id).await?;
            let actions = api.get_incident_actions(id).await?;
            print_incident_detail(&incident);
            println!("\nActions ({}):", actions.len());
            for action in actions {
                println!("  [{}] {} - {} ({})", action.outcome(), action.action_type, action.description, action.created_at);
            }
            Ok(())
        }
        Command::SetStatus { id, status } => {
            api.update_status(id, status).await?;
            println!("Incident #{} -> {}", id, status);
            Ok(())
        }
        Command::Stats => {
            let snapshot = DashboardSnapshot {
                stats: Some(api.dashboard_stats().await?),
                ..Default::default()
            };
            print_dashboard(&snapshot);
            Ok(())
        }
        Command::Mttr { days } => {
            let mttr = api.mttr(days).await?;
            println!(
                "MTTR over {} days: {} ({} resolved incidents)",
                days,
                format_minutes(mttr.mttr_minutes),
                mttr.sample_size
            );
            Ok(())
        }
    }
}

async fn watch(config: &Config, api: ApiClient) -> CliResult<()> {
    let channel =
        UpdateChannel::with_options(WsConnector::new(), config.reconnect_interval, Handle::current());
    let feed = DashboardFeed::start(api, &channel, FeedOptions::default());
    channel.connect(config.channel_url.clone());

    let mut updates = feed.watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_dashboard(&snapshot);
            }
        }
    }

    feed.stop();
    channel.disconnect();
    Ok(())
}

fn print_dashboard(snapshot: &DashboardSnapshot) {
    if let Some(error) = &snapshot.error {
        println!("! {}", error);
    }

    if let Some(stats) = &snapshot.stats {
        println!(
            "Total: {}  Active: {}  Resolved today: {}  Avg resolution: {}",
            stats.total_incidents,
            stats.active_incidents,
            stats.resolved_today,
            format_minutes(stats.avg_resolution_time_minutes)
        );

        let distribution: Vec<String> = stats
            .severity_counts()
            .iter()
            .map(|(severity, count)| format!("{}={}", severity, count))
            .collect();
        println!("Severity: {}", distribution.join(" "));

        for service in &stats.top_services {
            println!("  {:<24} {}", service.service, service.count);
        }
    }

    if !snapshot.incidents.is_empty() {
        let counts = snapshot.view_counts();
        println!("Recent incidents ({} active, {} resolved):", counts.active, counts.resolved);
        for incident in &snapshot.incidents {
            print_incident_line(incident);
        }
    }
}

fn print_incident_line(incident: &Incident) {
    let age = format_age(&incident.detected_at, Utc::now()).unwrap_or_else(|| incident.detected_at.clone());
    println!(
        "#{:<5} {:<8} {:<10} {:<20} {} ({})",
        incident.id, incident.severity, incident.status, incident.service_name, incident.title, age
    );
}

fn print_incident_detail(incident: &Incident) {
    println!("#{} {}", incident.id, incident.title);
    println!("Service:  {}", incident.service_name);
    println!("Severity: {}   Status: {}", incident.severity, incident.status);
    println!("Error:    {}", incident.error_type);
    println!("Detected: {}", incident.detected_at);
    if let Some(minutes) = incident.resolution_minutes() {
        println!("Resolved in {}", format_minutes(minutes));
    }
    if !incident.description.is_empty() {
        println!("\n{}", incident.description);
    }
    if let Some(root_cause) = &incident.root_cause {
        println!("\nRoot cause: {}", root_cause);
    }
    if !incident.resolution_steps.is_empty() {
        println!("\nResolution steps:");
        for (i, step) in incident.resolution_steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
}
