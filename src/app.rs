use crate::analysis::AnalysisClient;
use crate::cli::{ApprovalsCommands, Cli, Commands};
use crate::config::Config;
use crate::content_id::{self, ContentId};
use crate::coordinator::Coordinator;
use crate::messaging::{ContextId, ContextRegistry, LocalPageChannel, PageChannel};
use crate::page::{SimulatedMedia, SimulatedPage};
use crate::store::{self, ApprovalLookup, ApprovalStore};
use crate::surface::{ApplyStatus, ControlSurface, render};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::Duration;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run => run_coordinator(config).await,
        Commands::Demo { url } => run_demo(config, &url).await,
        Commands::Check { url, apply } => check(config, &url, apply).await,
        Commands::Status { url } => status(&config, &url).await,
        Commands::Approve { url } => record(&config, &url, true).await,
        Commands::Block { url } => record(&config, &url, false).await,
        Commands::Approvals { command } => approvals(&config, command).await,
        Commands::Health => health(config).await,
    }
}

async fn run_coordinator(config: Config) -> Result<()> {
    let store = store::create_store(&config);
    let coordinator = Coordinator::new(Arc::new(config), store, ContextRegistry::new())?;

    tracing::info!("coordinator running, ctrl-c to stop");
    tokio::select! {
        () = coordinator.run_retention_worker() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

/// Full three-context cycle in one process: coordinator injects an agent
/// into a simulated page, the control surface checks the content and the
/// verdict lands on the agent over the messaging channel.
async fn run_demo(config: Config, url: &str) -> Result<()> {
    if content_id::derive(url).is_none() {
        bail!("'{url}' does not resolve to a content identifier");
    }

    let registry = ContextRegistry::new();
    let store = store::create_store(&config);
    let analysis = AnalysisClient::new(&config.analysis)?;
    let coordinator = Coordinator::new(
        Arc::new(config),
        Arc::clone(&store),
        registry.clone(),
    )?;

    let page = SimulatedPage::new();
    page.attach_media(SimulatedMedia::new(true, false));
    page.navigate(url);

    let context = ContextId::generate();
    coordinator.ensure_agent(context.clone(), page.clone()).await;

    let channel: Arc<dyn PageChannel> = Arc::new(LocalPageChannel::new(registry));
    let surface = ControlSurface::new(channel, analysis, store);

    // Give the agent one evaluation pass before asking.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let before = surface.status(&context).await?;
    println!(
        "before check: blocked={} content={}",
        before.is_blocked,
        before
            .content_id
            .as_ref()
            .map_or("none", ContentId::as_str)
    );

    let report = surface.check(&context, url).await?;
    println!("{}", render::render_verdict(&report.verdict));
    match report.application {
        ApplyStatus::Applied => {}
        ApplyStatus::AgentUnreachable(context) => {
            println!("(no page agent in context {context}; nothing applied)");
        }
        ApplyStatus::Failed(reason) => println!("(override failed: {reason})"),
    }

    let after = surface.status(&context).await?;
    println!("after check: blocked={}", after.is_blocked);

    coordinator.page_closed(&context).await;
    Ok(())
}

async fn check(config: Config, url: &str, apply: bool) -> Result<()> {
    let analysis = AnalysisClient::new(&config.analysis)?;
    let verdict = analysis.fetch_verdict(url).await?;
    println!("{}", render::render_verdict(&verdict));

    if apply {
        let id = content_id::derive(url)
            .with_context(|| format!("'{url}' does not resolve to a content identifier"))?;
        let store = store::create_store(&config);
        if verdict.is_allowed() {
            store.approve(&id).await?;
            println!("recorded approval for {id}");
        } else {
            store.revoke(&id).await?;
            println!("removed any approval for {id}");
        }
    }
    Ok(())
}

async fn status(config: &Config, url: &str) -> Result<()> {
    let id = content_id::derive(url)
        .with_context(|| format!("'{url}' does not resolve to a content identifier"))?;
    let store = store::create_store(config);
    match store.lookup(&id).await {
        ApprovalLookup::Approved => println!("{id}: approved"),
        ApprovalLookup::NotApproved => println!("{id}: not approved"),
        ApprovalLookup::Failed => println!("{id}: store lookup failed (treated as not approved)"),
    }
    Ok(())
}

async fn record(config: &Config, url: &str, approve: bool) -> Result<()> {
    let id = content_id::derive(url)
        .with_context(|| format!("'{url}' does not resolve to a content identifier"))?;
    let store = store::create_store(config);
    if approve {
        store.approve(&id).await?;
        println!("approved {id}");
    } else {
        store.revoke(&id).await?;
        println!("blocked {id}");
    }
    Ok(())
}

async fn approvals(config: &Config, command: ApprovalsCommands) -> Result<()> {
    let store = store::create_store(config);
    let surface = ControlSurface::new(
        Arc::new(LocalPageChannel::new(ContextRegistry::new())),
        AnalysisClient::new(&config.analysis)?,
        store,
    );

    match command {
        ApprovalsCommands::List => {
            let approved = surface.list_approvals().await?;
            if approved.is_empty() {
                println!("no approved content");
            }
            for id in approved {
                println!("{id}");
            }
        }
        ApprovalsCommands::Clear => {
            let cleared = surface.clear_approvals().await?;
            println!("cleared {cleared} approval records");
        }
    }
    Ok(())
}

async fn health(config: Config) -> Result<()> {
    let store = store::create_store(&config);
    let coordinator = Coordinator::new(Arc::new(config), store, ContextRegistry::new())?;
    let report = coordinator.probe_analysis_health().await;
    if report.reachable {
        println!("analysis service: reachable");
    } else {
        println!(
            "analysis service: unreachable ({})",
            report.detail.unwrap_or_else(|| "no detail".into())
        );
    }
    Ok(())
}
