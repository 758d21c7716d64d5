//! LoanGuard CLI - Main entry point for CLI binary
//!
//! This binary provides the `loanguard` tool for querying the loan policy
//! and running the decision API.

use anyhow::{Context, Result};
use clap::Parser;
use loanguard_lib::engine::{
    api::{create_router, ApiState},
    catalog::{LoanStatus, Role},
    cli::{
        formatter::{format_statuses, CliFormatter},
        CheckQuery, Cli, Commands, OutputFormat,
    },
    config::Config,
    observability::init_tracing,
    rbac::{Enforcer, Policy, RawAccessRequest},
};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(code) => code,
        Err(e) => {
            CliFormatter::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let project_dir = cli.get_project_dir();
    let json_output = cli.format == OutputFormat::Json;

    if let Commands::Init { name } = &cli.command {
        init_tracing("info");
        cmd_init(name, &project_dir, json_output)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default(&project_dir)
        .with_context(|| format!("loading config from {}", project_dir.display()))?;
    init_tracing(&config.logging.filter);

    let policy_dir = config.policy_dir(&project_dir);

    if let Commands::Validate = cli.command {
        return cmd_validate(&policy_dir, json_output);
    }

    let policy = Policy::load(&policy_dir)
        .with_context(|| format!("loading policy from {}", policy_dir.display()))?;

    match cli.command {
        Commands::Check { query } => return Ok(cmd_check(&policy, query, json_output)),
        Commands::Permissions { role } => cmd_permissions(&policy, &role, json_output)?,
        Commands::Transitions { role, from } => {
            cmd_transitions(&policy, &role, &from, json_output)?
        }
        Commands::Capabilities { role, status } => {
            cmd_capabilities(&policy, &role, &status, json_output)?
        }
        Commands::Matrix => cmd_matrix(&policy, json_output)?,
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.api.host.clone());
            let port = port.unwrap_or(config.api.port);
            cmd_serve(policy, &config, &host, port)?
        }
        Commands::Init { .. } | Commands::Validate => unreachable!("handled above"),
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_init(name: &str, project_dir: &Path, json: bool) -> Result<()> {
    let config = Config::default_for_project(name);
    config.ensure_uninitialized(project_dir)?;

    std::fs::create_dir_all(project_dir)?;
    config.save(project_dir)?;

    let policy_dir = config.policy_dir(project_dir);
    std::fs::create_dir_all(&policy_dir)?;
    Policy::standard().save(&policy_dir)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "project_dir": project_dir.display().to_string(),
                "policy_dir": policy_dir.display().to_string(),
                "name": name
            })
        );
    } else {
        CliFormatter::success(&format!("Initialized loan policy project: {}", name));
        CliFormatter::kv("Config", &project_dir.join("loanguard.config.json").display().to_string());
        CliFormatter::kv("Policy", &policy_dir.join("policy.json").display().to_string());
    }

    Ok(())
}

fn cmd_check(policy: &Policy, query: CheckQuery, json: bool) -> ExitCode {
    let subject = query.describe();
    let allowed = Enforcer::new(policy).evaluate_raw(&RawAccessRequest::from(query));

    if json {
        println!("{}", serde_json::json!({ "allowed": allowed }));
    } else {
        CliFormatter::decision(allowed, &subject);
    }

    if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn cmd_permissions(policy: &Policy, role: &str, json: bool) -> Result<()> {
    let permissions = Enforcer::new(policy).user_permissions_for(role);

    if json {
        println!("{}", serde_json::to_string_pretty(&permissions)?);
    } else if permissions.is_empty() {
        CliFormatter::warning(&format!("No permissions for {}", role));
    } else {
        CliFormatter::header(&format!("Permissions for {}", role));
        for permission in &permissions {
            CliFormatter::item(permission.token());
        }
    }

    Ok(())
}

fn cmd_transitions(policy: &Policy, role: &str, from: &str, json: bool) -> Result<()> {
    let role: Role = role.parse()?;
    let from: LoanStatus = from.parse()?;
    let targets = Enforcer::new(policy).allowed_transitions(role, from);

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else if targets.is_empty() {
        CliFormatter::warning(&format!("{} cannot move a loan out of {}", role, from));
    } else {
        CliFormatter::header(&format!("{} from {}", role, from));
        for target in &targets {
            CliFormatter::item(&format!("{} ({})", target.token(), target.label()));
        }
    }

    Ok(())
}

fn cmd_capabilities(policy: &Policy, role: &str, status: &str, json: bool) -> Result<()> {
    let role: Role = role.parse()?;
    let status: LoanStatus = status.parse()?;
    let caps = Enforcer::new(policy).capabilities(role, status);

    if json {
        println!("{}", serde_json::to_string_pretty(&caps)?);
        return Ok(());
    }

    CliFormatter::header(&format!("{} with a loan in {}", role.label(), status.label()));
    CliFormatter::kv("Superuser", &caps.superuser.to_string());
    CliFormatter::kv("Can edit", &caps.can_edit.to_string());
    CliFormatter::kv("Transitions", &format_statuses(&caps.transitions));
    let assignable: Vec<&str> = caps.assignable_roles.iter().map(|r| r.token()).collect();
    if assignable.is_empty() {
        CliFormatter::kv("Can assign", "-");
    } else {
        CliFormatter::kv("Can assign", &assignable.join(", "));
    }
    let permissions: Vec<&str> = caps.permissions.iter().map(|p| p.token()).collect();
    CliFormatter::kv("Permissions", &permissions.join(", "));

    Ok(())
}

fn cmd_matrix(policy: &Policy, json: bool) -> Result<()> {
    let enforcer = Enforcer::new(policy);

    if json {
        let rows: Vec<_> = Role::ALL
            .iter()
            .map(|role| {
                let statuses: Vec<_> = LoanStatus::ALL
                    .iter()
                    .map(|status| enforcer.capabilities(*role, *status))
                    .collect();
                serde_json::json!({ "role": role, "statuses": statuses })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for role in Role::ALL {
        CliFormatter::header(&format!("{} ({})", role.label(), role.token()));
        CliFormatter::table_header(&["Status", "Edit", "May move to"]);
        for status in LoanStatus::ALL {
            let edit = if enforcer.can_edit(role, status) { "yes" } else { "no" };
            let targets = format_statuses(&enforcer.allowed_transitions(role, status));
            CliFormatter::table_row(&[status.token(), edit, &targets]);
        }
    }

    Ok(())
}

fn cmd_validate(policy_dir: &Path, json: bool) -> Result<ExitCode> {
    match Policy::load(policy_dir) {
        Ok(policy) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": true,
                        "name": policy.name(),
                        "version": policy.version()
                    })
                );
            } else {
                CliFormatter::success(&format!(
                    "Policy '{}' (v{}) is valid",
                    policy.name(),
                    policy.version()
                ));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "valid": false, "error": e.to_string() }));
            } else {
                CliFormatter::error(&e.to_string());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn cmd_serve(policy: Policy, config: &Config, host: &str, port: u16) -> Result<()> {
    let policy_name = policy.name().to_string();
    let app = create_router(ApiState::new(policy));

    let addr = format!("{}:{}", host, port);
    CliFormatter::info(&format!("{} decision API", config.service.name));
    CliFormatter::kv("Policy", &policy_name);
    CliFormatter::kv("Listening", &format!("http://{}", addr));
    tracing::info!(%addr, policy = %policy_name, "starting decision API");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
