use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{info, warn};

use gh_access::config::{init_tracing, PlatformArgs, Selection};
use gh_access::discovery::{self, ContributorMode, RepoOptions};
use gh_access::document::{render_entity, DOCUMENT_START};
use gh_access::{Entity, GitHub, Platform};

/// Crawls a GitHub organization and prints collaborators, team access and membership as YAML
#[derive(Parser, Debug)]
#[command(name = "discover", version, about)]
struct Args {
    #[command(flatten)]
    platform: PlatformArgs,

    /// Repository to inspect. `all` crawls every repository in the organization
    #[arg(short, long)]
    repo: Option<Selection>,

    /// Slug of the team to inspect, or `all`
    #[arg(short, long = "teamslug")]
    team: Option<Selection>,

    /// Include organization membership
    #[arg(short, long)]
    members: bool,

    /// Also collect commit authors
    #[arg(short, long)]
    complete: bool,

    /// Branch whose commits are walked with --complete, or `all`.
    /// Without it the default branch's contributor listing is used
    #[arg(long, requires = "complete")]
    branch: Option<String>,

    /// Ignore commits older than this RFC 3339 timestamp
    #[arg(long, requires = "branch")]
    since: Option<DateTime<Utc>>,

    /// Append the YAML to a file instead of printing it
    #[arg(short, long, num_args = 0..=1, default_missing_value = "stdout.yml")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = args.platform.resolve()?;
    let org = settings.org.as_str();
    let client = GitHub::new(&settings.token)?;

    let options = RepoOptions {
        contributors: ContributorMode::from_flags(args.complete, args.branch.as_deref()),
        since: args.since,
    };

    let mut sink: Box<dyn Write> = match &args.file {
        Some(path) => Box::new(OpenOptions::new().create(true).append(true).open(path)?),
        None => Box::new(std::io::stdout()),
    };
    sink.write_all(DOCUMENT_START.as_bytes())?;

    let mut written = 0;
    let mut skipped = 0;

    if let Some(selection) = &args.repo {
        let repos = match selection {
            Selection::All => client.list_repos(org).await?,
            Selection::Named(name) => vec![client.get_repo(org, name).await?],
        };
        for repo in repos {
            match discovery::discover_repo(&client, org, &repo, &options).await {
                Ok(access) => {
                    sink.write_all(render_entity(&Entity::from(access))?.as_bytes())?;
                    written += 1;
                }
                Err(err) => {
                    warn!(repo = %repo.name, "skipping repository: {err}");
                    skipped += 1;
                }
            }
        }
    }

    if let Some(selection) = &args.team {
        let teams = match selection {
            Selection::All => client.list_teams(org).await?,
            Selection::Named(slug) => vec![client.get_team(org, slug).await?],
        };
        for team in teams {
            match discovery::discover_team(&client, org, &team).await {
                Ok(membership) => {
                    sink.write_all(render_entity(&Entity::from(membership))?.as_bytes())?;
                    written += 1;
                }
                Err(err) => {
                    warn!(team = %team.slug, "skipping team: {err}");
                    skipped += 1;
                }
            }
        }
    }

    if args.members {
        let membership = discovery::discover_org(&client, org).await?;
        sink.write_all(render_entity(&Entity::from(membership))?.as_bytes())?;
        written += 1;
    }

    sink.flush()?;
    info!(written, skipped, "discovery finished");

    Ok(())
}
