use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use object_access::cli::{Cli, Commands};
use object_access::{
    config, logging, AccessApi, AccessRequest, AccessRequestStatus, ApiClient, AuthContext,
    Config, StatusFilter,
};

fn main() -> Result<()> {
    let args = Cli::parse();
    let cfg = config::load().with_overrides(args.api_url.clone(), args.token.clone());
    let command = args.command.unwrap_or(Commands::Request);

    if command.is_interactive() {
        logging::init_file(&cfg.log_file)?;
    } else {
        logging::init_stderr();
    }

    let token = cfg.require_token()?;
    let client = ApiClient::new(cfg.api_url.clone(), AuthContext::new(token))
        .context("Failed to build HTTP client")?;
    tracing::debug!(api_url = %cfg.api_url, "client ready");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    if command.is_interactive() {
        // key handlers spawn API calls, so the runtime must be entered
        let _guard = runtime.enter();
        return run_ui_mode(command, Arc::new(client), &cfg);
    }

    runtime.block_on(run_command(command, &client))
}

// ============================================================================
// ONE-SHOT COMMANDS
// ============================================================================

async fn run_command(command: Commands, client: &ApiClient) -> Result<()> {
    match command {
        Commands::Objects => {
            let objects = client.list_objects().await.context("Failed to load objects")?;
            println!("{:>6}  {:<12} {:<32} {:<12} {}", "ID", "CODE", "NAME", "STATUS", "CONTRACT");
            for obj in &objects {
                println!(
                    "{:>6}  {:<12} {:<32} {:<12} {}",
                    obj.id,
                    obj.code.as_deref().unwrap_or("-"),
                    obj.name,
                    obj.status.as_deref().unwrap_or("-"),
                    obj.contract_number.as_deref().unwrap_or("-"),
                );
            }
            println!("\n✓ {} objects", objects.len());
        }
        Commands::MyRequests => {
            let requests = client.my_requests().await.context("Failed to load your requests")?;
            print_requests(&requests);
        }
        Commands::Requests { object_id, status } => {
            let filter = parse_filter(&status)?;
            let requests = client
                .list_access_requests(object_id)
                .await
                .context("Failed to load access requests")?;
            let visible: Vec<AccessRequest> = requests
                .into_iter()
                .filter(|r| filter.matches(r))
                .collect();
            print_requests(&visible);
        }
        Commands::RequestAccess { object_id, reason } => {
            match client.request_access(object_id, reason.as_deref()).await {
                Ok(()) => println!("✅ Access requested for object {}", object_id),
                Err(e) => anyhow::bail!(e.user_message("Failed to submit request")),
            }
        }
        Commands::Approve { object_id, request_id } => {
            client
                .approve(object_id, request_id)
                .await
                .context("Failed to approve request")?;
            println!("✅ Request #{} approved", request_id);
        }
        Commands::Reject { object_id, request_id, reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                anyhow::bail!("A rejection reason is required");
            }
            client
                .reject(object_id, request_id, reason)
                .await
                .context("Failed to reject request")?;
            println!("✅ Request #{} rejected", request_id);
        }
        Commands::Admin | Commands::Request => unreachable!("interactive commands run in the UI"),
    }
    Ok(())
}

fn parse_filter(value: &str) -> Result<StatusFilter> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(StatusFilter::All);
    }
    match AccessRequestStatus::parse(value) {
        Some(status) => Ok(StatusFilter::from(Some(status))),
        None => anyhow::bail!("Unknown status {:?} (expected PENDING, APPROVED, REJECTED or ALL)", value),
    }
}

fn print_requests(requests: &[AccessRequest]) {
    println!(
        "{:>6}  {:<28} {:<20} {:<9} {:<17} {}",
        "ID", "OBJECT", "REQUESTER", "STATUS", "CREATED", "NOTE"
    );
    for req in requests {
        let created = req
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let note = match req.status {
            AccessRequestStatus::Rejected => req.rejection_reason.clone().unwrap_or_default(),
            _ => req.reason.clone().unwrap_or_default(),
        };
        println!(
            "{:>6}  {:<28} {:<20} {:<9} {:<17} {}",
            req.id,
            req.object_label(),
            req.requester_label(),
            req.status.as_str(),
            created,
            note,
        );
    }
    println!("\n✓ {} requests", requests.len());
}

// ============================================================================
// INTERACTIVE MODE
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(command: Commands, api: Arc<dyn AccessApi>, cfg: &Config) -> Result<()> {
    use object_access::ui::{self, AdminApp, RequesterApp};
    use object_access::views::{AdminView, RequesterView};

    tracing::info!(api_url = %cfg.api_url, ?command, "starting interactive view");

    match command {
        Commands::Admin => {
            let mut view = AdminView::new(api);
            view.mount();
            ui::run(&mut AdminApp::new(view))?;
        }
        _ => {
            let mut view = RequesterView::new(api);
            view.mount();
            ui::run(&mut RequesterApp::new(view))?;
        }
    }

    println!("\n✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_command: Commands, _api: Arc<dyn AccessApi>, _cfg: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the one-shot commands (object-access --help)");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("all").unwrap(), StatusFilter::All);
        assert_eq!(parse_filter("pending").unwrap(), StatusFilter::Pending);
        assert_eq!(parse_filter("REJECTED").unwrap(), StatusFilter::Rejected);
        assert!(parse_filter("closed").is_err());
    }
}
