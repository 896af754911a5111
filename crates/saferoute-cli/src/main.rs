use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use saferoute_cli::{load_hazards, parse_location, SafeRouteClient};
use saferoute_core::mock::{generate_mock_hazards, generate_mock_shelters};
use saferoute_core::{
    compute_avoidance_with_rules, AvoidanceRules, FeedFilter, FeedOrder, HazardReport,
    HazardSeverity, HazardType, Location,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "saferoute", author, version, about, long_about = None)]
struct Cli {
    /// SafeRoute server URL
    #[arg(long, global = true, env = "SAFEROUTE_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find hazards on the straight segment and print detour waypoints (offline)
    Avoid {
        /// Origin as LAT,LNG
        #[arg(long, value_parser = parse_location)]
        from: Location,
        /// Destination as LAT,LNG
        #[arg(long, value_parser = parse_location)]
        to: Location,
        /// Hazards JSON file
        #[arg(long)]
        hazards: PathBuf,
        #[arg(long, default_value_t = saferoute_core::rules::DEFAULT_BUFFER_FACTOR)]
        buffer_factor: f64,
        #[arg(long, default_value_t = saferoute_core::rules::DEFAULT_SAFETY_MARGIN_M)]
        safety_margin: f64,
    },
    /// Generate random hazards and shelters around a center (offline)
    Mock {
        #[arg(long, value_parser = parse_location, default_value = "27.6228,85.5412")]
        center: Location,
        #[arg(long, default_value_t = 15)]
        hazards: usize,
        #[arg(long, default_value_t = 8)]
        shelters: usize,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report a hazard to the server
    Report {
        #[arg(long = "type", value_enum)]
        hazard_type: HazardTypeArg,
        #[arg(long, value_enum)]
        severity: SeverityArg,
        /// Location as LAT,LNG
        #[arg(long, value_parser = parse_location)]
        at: Location,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        reported_by: Option<String>,
        /// Override the severity's default impact radius (meters)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Plan a hazard-aware route through the server
    Plan {
        #[arg(long, value_parser = parse_location)]
        from: Location,
        #[arg(long, value_parser = parse_location)]
        to: Location,
        #[arg(long)]
        session: Option<String>,
    },
    /// Browse and moderate the hazard feed
    Hazards {
        #[command(subcommand)]
        action: Option<HazardsAction>,
        #[arg(long = "type", value_enum)]
        hazard_type: Option<HazardTypeArg>,
        #[arg(long, value_enum)]
        severity: Option<SeverityArg>,
        #[arg(long)]
        verified: Option<bool>,
        /// Sort by severity instead of recency
        #[arg(long)]
        by_severity: bool,
    },
    /// List the nearest open shelters
    Shelters {
        #[arg(long, value_parser = parse_location)]
        near: Location,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum HazardsAction {
    /// Total / verified / unverified counts
    Stats,
    Upvote { id: String },
    /// Mark a hazard verified (needs SAFEROUTE_ADMIN_TOKEN)
    Verify {
        id: String,
        #[arg(long)]
        revoke: bool,
        #[arg(long, env = "SAFEROUTE_ADMIN_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HazardTypeArg {
    Flood,
    Fire,
    Earthquake,
    Landslide,
    Storm,
    Other,
}

impl From<HazardTypeArg> for HazardType {
    fn from(arg: HazardTypeArg) -> Self {
        match arg {
            HazardTypeArg::Flood => HazardType::Flood,
            HazardTypeArg::Fire => HazardType::Fire,
            HazardTypeArg::Earthquake => HazardType::Earthquake,
            HazardTypeArg::Landslide => HazardType::Landslide,
            HazardTypeArg::Storm => HazardType::Storm,
            HazardTypeArg::Other => HazardType::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for HazardSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => HazardSeverity::Low,
            SeverityArg::Medium => HazardSeverity::Medium,
            SeverityArg::High => HazardSeverity::High,
            SeverityArg::Critical => HazardSeverity::Critical,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut client = SafeRouteClient::new(cli.url);

    match cli.command {
        Command::Avoid {
            from,
            to,
            hazards,
            buffer_factor,
            safety_margin,
        } => {
            let hazards = load_hazards(&hazards)?;
            let rules = AvoidanceRules {
                buffer_factor,
                safety_margin_m: safety_margin,
                ..AvoidanceRules::default()
            }
            .sanitized();
            let result = compute_avoidance_with_rules(from, to, &hazards, &rules);
            eprintln!(
                "{} of {} hazards in path, {} detour waypoints",
                result.hazards_in_path.len(),
                hazards.len(),
                result.detour_waypoints.len()
            );
            print_json(&result)?;
        }
        Command::Mock {
            center,
            hazards,
            shelters,
            seed,
            out,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let document = serde_json::json!({
                "hazards": generate_mock_hazards(&mut rng, center, hazards, Utc::now()),
                "shelters": generate_mock_shelters(&mut rng, center, shelters),
            });
            let json = serde_json::to_string_pretty(&document)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "Wrote {} hazards and {} shelters to {}",
                        hazards,
                        shelters,
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        Command::Report {
            hazard_type,
            severity,
            at,
            description,
            reported_by,
            radius,
        } => {
            let report = HazardReport {
                hazard_type: hazard_type.into(),
                severity: severity.into(),
                location: at,
                description,
                reported_by,
                impact_radius_m: radius,
                image: None,
            };
            report.validate()?;
            let hazard = client.report_hazard(&report).await?;
            println!("Reported hazard {} ({:.0} m radius)", hazard.id, hazard.impact_radius_m);
        }
        Command::Plan { from, to, session } => {
            let planned = client.plan_route(from, to, session.as_deref()).await?;
            let route = &planned.route;
            println!(
                "Route {}: {:.2} km, ~{:.0} min, outcome {:?}",
                route.id, route.distance_km, route.estimated_time_min, route.outcome
            );
            if !route.hazards_avoided.is_empty() {
                println!("Avoided hazards: {}", route.hazards_avoided.join(", "));
            }
            for (i, waypoint) in route.waypoints.iter().enumerate() {
                println!("  detour {}: {}", i + 1, waypoint);
            }
        }
        Command::Hazards {
            action,
            hazard_type,
            severity,
            verified,
            by_severity,
        } => match action {
            Some(HazardsAction::Stats) => print_json(&client.hazard_stats().await?)?,
            Some(HazardsAction::Upvote { id }) => {
                let hazard = client.upvote_hazard(&id).await?;
                println!("Hazard {} now has {} upvotes", hazard.id, hazard.upvotes);
            }
            Some(HazardsAction::Verify { id, revoke, token }) => {
                client.set_admin_token(token);
                let hazard = client.verify_hazard(&id, !revoke).await?;
                println!("Hazard {} verified: {}", hazard.id, hazard.verified);
            }
            None => {
                let filter = FeedFilter {
                    hazard_type: hazard_type.map(Into::into),
                    severity: severity.map(Into::into),
                    verified,
                };
                let order = if by_severity {
                    FeedOrder::Severity
                } else {
                    FeedOrder::Recent
                };
                for hazard in client.list_hazards(&filter, order).await? {
                    println!(
                        "{}  {:<10} {:<8} {}  {}{}",
                        hazard.reported_at.format("%Y-%m-%d %H:%M"),
                        hazard.hazard_type.as_str(),
                        hazard.severity.as_str(),
                        hazard.location,
                        if hazard.verified { "[verified] " } else { "" },
                        hazard.description
                    );
                }
            }
        },
        Command::Shelters { near, limit } => {
            for entry in client.nearest_shelters(near, limit).await? {
                println!(
                    "{:>6.2} km  {}  ({} free of {})",
                    entry.distance_m / 1000.0,
                    entry.shelter.name,
                    entry.shelter.available_capacity(),
                    entry.shelter.capacity
                );
            }
        }
    }

    Ok(())
}
