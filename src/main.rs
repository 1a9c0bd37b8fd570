use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use turnos_access::config::{self, AppConfig};
use turnos_access::fixtures::{self, Fixtures};
use turnos_access::models::{Action, AsResource, EditDraft, TurnoRecord};
use turnos_access::{access, reconcile, report};

#[derive(Parser)]
#[command(name = "turnos-access")]
#[command(about = "Role-based access checks and turno payload reconciliation", long_about = None)]
struct Cli {
    /// JSON config file (falls back to $TURNOS_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter, e.g. "debug" or "turnos_access=debug"
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a principal may act on a single resource
    Check {
        #[arg(long)]
        principal: PathBuf,
        #[arg(long)]
        resource: PathBuf,
        #[arg(long, value_enum)]
        action: Action,
    },
    /// List the usuarios, turnos and entregas a principal may view
    Visible {
        #[arg(long)]
        principal: PathBuf,
        #[arg(long)]
        usuarios: Option<PathBuf>,
        #[arg(long)]
        turnos: Option<PathBuf>,
        #[arg(long)]
        entregas: Option<PathBuf>,
    },
    /// Print the edit form draft for an existing turno
    Draft {
        #[arg(long)]
        existing: PathBuf,
    },
    /// Merge a draft into an existing turno and print the request body
    Reconcile {
        #[arg(long)]
        existing: Option<PathBuf>,
        #[arg(long)]
        draft: PathBuf,
        /// Build a POST body for a new turno instead of a PATCH body
        #[arg(long)]
        create: bool,
        /// Principal to authorize the submission for
        #[arg(long)]
        principal: Option<PathBuf>,
    },
    /// Generate a markdown report of what a principal can see
    Report {
        #[arg(long)]
        principal: PathBuf,
        #[arg(long)]
        usuarios: Option<PathBuf>,
        #[arg(long)]
        turnos: Option<PathBuf>,
        #[arg(long)]
        entregas: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(config::CONFIG_ENV).map(PathBuf::from));
    let app_config = AppConfig::load(config_path.as_deref())?;
    let dictionary = app_config.dictionary();

    match cli.command {
        Commands::Check {
            principal,
            resource,
            action,
        } => {
            let principal = fixtures::load_principal(&principal, &dictionary)?;
            let resource = fixtures::load_resource(&resource, &dictionary)?;
            match access::authorize(&principal, resource.as_resource(), action) {
                Ok(()) => println!(
                    "Allowed: {} may {} this {}.",
                    principal.role(),
                    action,
                    resource.as_resource().kind()
                ),
                Err(err) => println!("Denied: {err}."),
            }
        }
        Commands::Visible {
            principal,
            usuarios,
            turnos,
            entregas,
        } => {
            let principal = fixtures::load_principal(&principal, &dictionary)?;
            let mut data =
                Fixtures::load(usuarios.as_deref(), turnos.as_deref(), entregas.as_deref())?;
            data.normalize_modules(&dictionary);

            let usuarios = access::visible(&principal, &data.usuarios);
            let turnos = access::visible(&principal, &data.turnos);
            let entregas = access::visible(&principal, &data.entregas);

            println!("Visible to {} {}:", principal.role(), principal.id());
            for usuario in usuarios {
                println!("- usuario {} ({}, {})", usuario.nombre, usuario.email, usuario.role);
            }
            for turno in turnos {
                println!(
                    "- turno {} ({}, {})",
                    turno.titulo.as_deref().unwrap_or("sin titulo"),
                    turno.modulo.as_deref().unwrap_or("sin modulo"),
                    turno
                        .fecha
                        .map(|fecha| fecha.to_string())
                        .unwrap_or_else(|| "sin fecha".to_string())
                );
            }
            for entrega in entregas {
                println!(
                    "- entrega {} by {} ({})",
                    entrega.id, entrega.alumno_id, entrega.review_status
                );
            }
        }
        Commands::Draft { existing } => {
            let existing: TurnoRecord = fixtures::load_json(&existing)?;
            let draft = EditDraft::from_record(&existing);
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        Commands::Reconcile {
            existing,
            draft,
            create,
            principal,
        } => {
            anyhow::ensure!(
                create || existing.is_some(),
                "--existing is required unless --create is given"
            );
            let existing: TurnoRecord = match existing {
                Some(path) => fixtures::load_json(&path)?,
                None => TurnoRecord::default(),
            };
            let draft: EditDraft = fixtures::load_json(&draft)?;
            let payload = reconcile::reconcile(
                &existing,
                &draft,
                create,
                &app_config.reconcile_options(),
            )
            .context("draft could not be reconciled")?;

            if let Some(path) = principal {
                let principal = fixtures::load_principal(&path, &dictionary)?;
                let mut target = existing.clone();
                if create {
                    target.modulo = draft.modulo.clone();
                }
                dictionary.normalize_in_place(&mut target.modulo);
                let action = if create { Action::Create } else { Action::Edit };
                access::authorize(&principal, target.as_resource(), action)?;
            }

            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Report {
            principal,
            usuarios,
            turnos,
            entregas,
            out,
        } => {
            let principal = fixtures::load_principal(&principal, &dictionary)?;
            let mut data =
                Fixtures::load(usuarios.as_deref(), turnos.as_deref(), entregas.as_deref())?;
            data.normalize_modules(&dictionary);
            let today = chrono::Utc::now().date_naive();
            let report = report::build_report(&principal, &data, today);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
