use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use gh_access::config::{init_tracing, PlatformArgs, Selection};
use gh_access::document::Document;
use gh_access::{GitHub, Reconciler, Report, TeamMembership};

/// Modifies GitHub organization and team membership to match a YAML document
#[derive(Parser, Debug)]
#[command(name = "modify", version, about)]
struct Args {
    #[command(flatten)]
    platform: PlatformArgs,

    /// Input YAML document
    #[arg(short, long)]
    file: PathBuf,

    /// Slug of the team to modify, or `all` for every team in the document
    #[arg(short, long = "teamslug")]
    team: Option<Selection>,

    /// Set organization membership from the document
    #[arg(short, long)]
    members: bool,

    /// Show planned changes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Create teams that are in the document but not on GitHub
    #[arg(long)]
    create_teams: bool,

    /// Print the change report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = args.platform.resolve()?;
    let document = Document::load(&args.file)?;

    // Everything requested must be in the document before anything is changed.
    let teams: Vec<&TeamMembership> = match &args.team {
        None => vec![],
        Some(Selection::All) => document.teams().collect(),
        Some(Selection::Named(slug)) => vec![document.team(slug)?],
    };
    let org = match args.members {
        true => Some(document.org(&settings.org)?),
        false => None,
    };
    if teams.is_empty() && org.is_none() {
        warn!("nothing to do; select teams with --teamslug and/or pass --members");
        return Ok(());
    }

    let client = GitHub::new(&settings.token)?;
    let reconciler = Reconciler::new(&client, &settings.org)
        .dry_run(args.dry_run)
        .create_teams(args.create_teams);

    let mut report = Report::default();
    for team in teams {
        report.extend(reconciler.reconcile_team(team).await);
    }
    if let Some(org) = org {
        report.extend(reconciler.reconcile_org(org).await);
    }

    let summary = report.summary();
    if args.json {
        let result = serde_json::json!({
            "dry_run": args.dry_run,
            "summary": summary,
            "changes": report.changes,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for change in &report.changes {
            println!("{change}");
        }
    }
    info!(
        changed = summary.changed,
        unchanged = summary.unchanged,
        warnings = summary.warnings,
        "modify finished"
    );

    if summary.warnings > 0 {
        anyhow::bail!("{} change(s) failed", summary.warnings);
    }
    Ok(())
}
