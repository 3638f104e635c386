use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use gatepass::{
    config::GatePassConfig, Destination, FileStore, LifecycleAction, LifecycleOrchestrator,
    MenuResolver, NewGatePass, NewItem, Outcome, Requester, Role, Stage, StatusCategory,
};

#[derive(Parser)]
#[command(name = "gatepass")]
#[command(about = "Gate pass approval pipeline for physical item movement")]
#[command(long_about = "Tracks gate pass requests through the Executive -> Verify -> Dispatch -> \
                       Receive approval pipeline, with role-scoped actions and returnable item \
                       tracking. State is kept in a local JSON store; every mutating command \
                       takes the acting identity explicitly via --service-no and --role.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default gatepass.toml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, help = "Overwrite gatepass.toml if it already exists")]
        force: bool,
    },
    /// Create a new gate pass request
    Create {
        /// Acting service number (the pass creator)
        #[arg(long)]
        service_no: String,
        /// Acting role name
        #[arg(long)]
        role: String,
        /// Executive officer of record, when the request is pre-assigned
        #[arg(long, help = "Service number of the executive officer of record")]
        assignee: Option<String>,
        /// Internal destination location (mutually exclusive with --contact-name)
        #[arg(long, help = "Internal directory location the items travel to")]
        location: Option<String>,
        /// External receiver contact name (non-SLT destination)
        #[arg(long, requires = "contact_phone")]
        contact_name: Option<String>,
        /// External receiver contact phone (non-SLT destination)
        #[arg(long, requires = "contact_name")]
        contact_phone: Option<String>,
        /// Item in SERIAL:MODEL:CATEGORY:QTY:returnable|fixed form, repeatable
        #[arg(long = "item", required = true, help = "e.g. --item SN001:ER605:Router:1:returnable")]
        items: Vec<String>,
    },
    /// Show a gate pass with its items and audit history
    Show {
        /// Gate pass reference number
        reference: String,
    },
    /// List gate passes, optionally scoped to one requester
    List {
        /// Only list passes created by this service number
        #[arg(long, help = "Restrict to passes created by this service number")]
        mine: Option<String>,
    },
    /// Approve the pass at its current pending stage
    Approve {
        reference: String,
        #[arg(long)]
        service_no: String,
        #[arg(long)]
        role: String,
    },
    /// Reject the pass at its current pending stage (terminal)
    Reject {
        reference: String,
        #[arg(long)]
        service_no: String,
        #[arg(long)]
        role: String,
    },
    /// Cancel a pass still awaiting the executive decision
    Cancel {
        reference: String,
        #[arg(long)]
        service_no: String,
        #[arg(long)]
        role: String,
    },
    /// Mark returnable items as returned through the gate
    Return {
        reference: String,
        #[arg(long)]
        service_no: String,
        #[arg(long)]
        role: String,
        /// Serial numbers to mark returned
        #[arg(long = "serial", required = true)]
        serials: Vec<String>,
    },
    /// Print the navigation menu for a role name
    Menu {
        /// Role name (canonical or legacy alias)
        role: String,
    },
    /// Display pipeline status overview across all passes
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatePassConfig::load()?;
    if config.observability.tracing_enabled {
        gatepass::init_telemetry()?;
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { force } => init_command(force),
        Commands::Create {
            service_no,
            role,
            assignee,
            location,
            contact_name,
            contact_phone,
            items,
        } => {
            let orchestrator = open_orchestrator(&config).await?;
            let requester = requester(&service_no, &role)?;
            let destination = parse_destination(location, contact_name, contact_phone)?;
            let items = items
                .iter()
                .map(|spec| parse_item(spec))
                .collect::<Result<Vec<_>>>()?;
            let pass = orchestrator
                .create(
                    &requester,
                    NewGatePass {
                        executive_officer_assignee: assignee,
                        destination,
                        items,
                    },
                )
                .await?;
            println!("✅ Created gate pass {}", pass.reference_number);
            println!("   Status: {} | Items: {}", pass.status, pass.items.len());
            Ok(())
        }
        Commands::Show { reference } => {
            let orchestrator = open_orchestrator(&config).await?;
            let pass = orchestrator.get(&reference).await?;
            print_pass(&pass);
            Ok(())
        }
        Commands::List { mine } => {
            let orchestrator = open_orchestrator(&config).await?;
            let passes = match mine {
                Some(service_no) => orchestrator.list_for_actor(&service_no).await?,
                None => orchestrator.list_all().await?,
            };
            if passes.is_empty() {
                println!("No gate passes found.");
            }
            for pass in passes {
                println!(
                    "{}  {:<20}  by {}  ({} items)",
                    pass.reference_number,
                    pass.status.to_string(),
                    pass.requester_service_no,
                    pass.items.len()
                );
            }
            Ok(())
        }
        Commands::Approve {
            reference,
            service_no,
            role,
        } => {
            let orchestrator = open_orchestrator(&config).await?;
            let requester = requester(&service_no, &role)?;
            let stage = pending_stage(&orchestrator, &reference).await?;
            let status = orchestrator
                .transition(&requester, &reference, LifecycleAction::Approve(stage))
                .await?;
            println!("✅ {reference} approved, now at: {status}");
            Ok(())
        }
        Commands::Reject {
            reference,
            service_no,
            role,
        } => {
            let orchestrator = open_orchestrator(&config).await?;
            let requester = requester(&service_no, &role)?;
            let stage = pending_stage(&orchestrator, &reference).await?;
            let status = orchestrator
                .transition(&requester, &reference, LifecycleAction::Reject(stage))
                .await?;
            println!("⛔ {reference} rejected, now at: {status}");
            Ok(())
        }
        Commands::Cancel {
            reference,
            service_no,
            role,
        } => {
            let orchestrator = open_orchestrator(&config).await?;
            let requester = requester(&service_no, &role)?;
            let status = orchestrator.cancel(&requester, &reference).await?;
            println!("🚫 {reference} canceled, now at: {status}");
            Ok(())
        }
        Commands::Return {
            reference,
            service_no,
            role,
            serials,
        } => {
            let orchestrator = open_orchestrator(&config).await?;
            let requester = requester(&service_no, &role)?;
            let serial_set: HashSet<String> = serials.into_iter().collect();
            let requested = serial_set.len();
            let updated = orchestrator
                .mark_returned(&requester, &reference, &serial_set)
                .await?;
            println!("📦 {updated} of {requested} item(s) marked returned on {reference}");
            Ok(())
        }
        Commands::Menu { role } => {
            let menu = MenuResolver::menu_for_name(&role, config.menu.unknown_role_fallback)?;
            println!("Menu for {role}:");
            for entry in menu {
                println!("   {:<20} -> {}", entry.title, entry.target);
            }
            Ok(())
        }
        Commands::Status => {
            let orchestrator = open_orchestrator(&config).await?;
            let passes = orchestrator.list_all().await?;
            let mut pending = 0;
            let mut approved = 0;
            let mut rejected = 0;
            let mut terminal = 0;
            for pass in &passes {
                match pass.status.category() {
                    StatusCategory::Pending => pending += 1,
                    StatusCategory::Approved => approved += 1,
                    StatusCategory::Rejected => rejected += 1,
                    StatusCategory::Terminal => terminal += 1,
                }
            }
            println!("📊 GATE PASS STATUS");
            println!("   Total passes: {}", passes.len());
            println!("   Pending:  {pending}");
            println!("   Approved: {approved}");
            println!("   Rejected: {rejected}");
            println!("   Canceled: {terminal}");
            Ok(())
        }
    }
}

fn init_command(force: bool) -> Result<()> {
    let path = Path::new("gatepass.toml");
    if path.exists() && !force {
        bail!("gatepass.toml already exists (use --force to overwrite)");
    }
    GatePassConfig::default().save_to_file(path)?;
    println!("✅ Wrote default configuration to gatepass.toml");
    Ok(())
}

/// Stage the pass currently awaits a decision at. The transition itself
/// re-validates against the live status, so a pass advanced by someone else
/// between this read and the call fails with the usual InvalidTransition.
async fn pending_stage(
    orchestrator: &LifecycleOrchestrator,
    reference: &str,
) -> Result<Stage> {
    let pass = orchestrator.get(reference).await?;
    match pass.status.stage() {
        Some(stage) if pass.status.outcome() == Outcome::Pending => Ok(stage),
        _ => bail!(
            "{} is at '{}' and has no pending decision",
            reference,
            pass.status
        ),
    }
}

async fn open_orchestrator(config: &GatePassConfig) -> Result<LifecycleOrchestrator> {
    let store = FileStore::open(&config.store.state_file_path)
        .await
        .with_context(|| {
            format!(
                "failed to open workflow store at {}",
                config.store.state_file_path
            )
        })?;
    Ok(LifecycleOrchestrator::new(Arc::new(store)))
}

fn requester(service_no: &str, role: &str) -> Result<Requester> {
    let role: Role = role
        .parse()
        .map_err(|err| anyhow!("{err} (expected one of the canonical role names)"))?;
    Ok(Requester::new(service_no, role))
}

fn parse_destination(
    location: Option<String>,
    contact_name: Option<String>,
    contact_phone: Option<String>,
) -> Result<Destination> {
    match (location, contact_name, contact_phone) {
        (Some(location), None, None) => Ok(Destination::Internal { location }),
        (None, Some(contact_name), Some(contact_phone)) => Ok(Destination::NonSlt {
            contact_name,
            contact_phone,
        }),
        (Some(_), Some(_), _) => bail!("--location and --contact-name are mutually exclusive"),
        _ => bail!("destination required: either --location or --contact-name with --contact-phone"),
    }
}

/// Parse SERIAL:MODEL:CATEGORY:QTY:returnable|fixed into an item spec.
fn parse_item(spec: &str) -> Result<NewItem> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 5 {
        bail!("item must be SERIAL:MODEL:CATEGORY:QTY:returnable|fixed, got: {spec}");
    }
    let item_quantity: u32 = parts[3]
        .parse()
        .with_context(|| format!("invalid quantity in item spec: {spec}"))?;
    let is_returnable = match parts[4] {
        "returnable" => true,
        "fixed" => false,
        other => bail!("item flag must be 'returnable' or 'fixed', got: {other}"),
    };
    Ok(NewItem {
        serial_no: parts[0].to_string(),
        item_model: parts[1].to_string(),
        item_category: parts[2].to_string(),
        item_quantity,
        is_returnable,
    })
}

fn print_pass(pass: &gatepass::GatePass) {
    let (stage, outcome) = pass.status.label();
    println!("Gate Pass {}", pass.reference_number);
    println!(
        "   Status: {} ({} / {})",
        pass.status.code(),
        stage,
        outcome
    );
    println!("   Requested by: {}", pass.requester_service_no);
    if let Some(assignee) = &pass.executive_officer_assignee {
        println!("   Executive officer: {assignee}");
    }
    match &pass.destination {
        Destination::Internal { location } => println!("   Destination: {location} (internal)"),
        Destination::NonSlt {
            contact_name,
            contact_phone,
        } => println!("   Destination: {contact_name} / {contact_phone} (non-SLT)"),
    }
    println!("   Items:");
    for item in &pass.items {
        let returnable = if item.is_returnable {
            format!("{:?}", item.return_status)
        } else {
            "-".to_string()
        };
        println!(
            "      {} {} ({}) x{} [{}]",
            item.serial_no, item.item_model, item.item_category, item.item_quantity, returnable
        );
    }
    if !pass.history.is_empty() {
        println!("   History:");
        for record in &pass.history {
            println!(
                "      {} {} by {} ({}) -> {}",
                record.at.format("%Y-%m-%d %H:%M:%S"),
                record.action,
                record.actor_service_no,
                record.role,
                record.resulting_status
            );
        }
    }
}
