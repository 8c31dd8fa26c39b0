//! UniBus CLI entry point

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

use unibus::cli::{Cli, Command, OutputFormat};
use unibus::config::Config;
use unibus::modules::identity::NewUser;
use unibus::{Cancellation, Platform, Role};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN keeps CLI output clean)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Handlers { format } => cmd_handlers(&config, format),
        Command::Simulate {
            faculty,
            students,
            professors,
            admins,
            orphans,
            format,
        } => {
            let plan = SimulationPlan {
                faculty,
                students,
                professors,
                admins,
                orphans,
            };
            cmd_simulate(&config, plan, format).await
        }
        Command::Config => cmd_config(&config),
    }
}

fn cmd_handlers(config: &Config, format: OutputFormat) -> Result<()> {
    let platform = Platform::new(config.bus.clone());
    let registrations = platform.bus().registry().registrations();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = registrations
                .iter()
                .map(|r| serde_json::json!({ "event": r.event_type, "handler": r.handler }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            for r in registrations {
                println!("{:<16} {}", r.event_type.cyan(), r.handler);
            }
        }
    }
    Ok(())
}

struct SimulationPlan {
    faculty: String,
    students: usize,
    professors: usize,
    admins: usize,
    orphans: usize,
}

/// Create one user; dispatch failures after commit are collected, not fatal
async fn create_user(platform: &Platform, new_user: NewUser, cancel: &Cancellation, failures: &mut Vec<String>) -> Result<()> {
    match platform.identity().create_user(new_user, cancel).await {
        Ok(user) => {
            debug!(user_id = %user.id, "cmd_simulate: user created");
            Ok(())
        }
        Err(e) if e.is_committed() => {
            failures.push(e.to_string());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn new_user(username: String, role: Role, faculty_id: Option<Uuid>, index_number: Option<String>) -> NewUser {
    NewUser {
        first_name: username.clone(),
        last_name: role.as_str().to_string(),
        username,
        faculty_id,
        role,
        index_number,
    }
}

async fn cmd_simulate(config: &Config, plan: SimulationPlan, format: OutputFormat) -> Result<()> {
    let platform = Platform::new(config.bus.clone());
    let cancel = Cancellation::new();
    let mut failures = Vec::new();

    let faculty = platform.faculties().create_faculty(&plan.faculty, &cancel).await?;

    for i in 0..plan.students {
        let user = new_user(
            format!("student{:03}", i),
            Role::Student,
            Some(faculty.id),
            Some(format!("S{:05}", i)),
        );
        create_user(&platform, user, &cancel, &mut failures).await?;
    }
    for i in 0..plan.professors {
        let user = new_user(format!("professor{:03}", i), Role::Professor, Some(faculty.id), None);
        create_user(&platform, user, &cancel, &mut failures).await?;
    }
    for i in 0..plan.admins {
        let user = new_user(format!("admin{:03}", i), Role::Admin, None, None);
        create_user(&platform, user, &cancel, &mut failures).await?;
    }
    for i in 0..plan.orphans {
        let user = new_user(
            format!("orphan{:03}", i),
            Role::Student,
            Some(Uuid::now_v7()),
            Some(format!("O{:05}", i)),
        );
        create_user(&platform, user, &cancel, &mut failures).await?;
    }

    let counts = platform.analytics().snapshot().await;
    let roster = platform
        .faculties()
        .roster()
        .get(faculty.id)
        .await
        .ok_or_else(|| eyre::eyre!("Faculty {} vanished from roster", faculty.id))?;
    let stored_users = platform.identity().directory().len().await;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "counts": counts,
                "faculty": roster,
                "stored_users": stored_users,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("{} Faculty {} ({})", "✓".green(), roster.name.cyan(), roster.id);
            println!("  Roster: {} students, {} professors", roster.students.len(), roster.professors.len());
            println!("Analytics");
            println!("  Students: {}", counts.students);
            println!("  Professors: {}", counts.professors);
            println!("  Admins: {}", counts.admins);
            println!("  Faculties: {}", counts.faculties);
            println!("Users stored: {}", stored_users);
            if !failures.is_empty() {
                println!("{} {} dispatch failure(s) after commit:", "!".yellow(), failures.len());
                for failure in &failures {
                    println!("  {}", failure.yellow());
                }
            }
        }
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
