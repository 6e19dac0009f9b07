use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mono_release::cli::{run_init_workflow, run_release_workflow, ReleaseWorkflowArgs};
use mono_release::{ui, ErrorKind, ReleaseError};

#[derive(Parser)]
#[command(
    name = "mono-release",
    version,
    about = "Independent semantic releases for the projects of a monorepo"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Show debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bump, changelog, commit and tag every project with releasable commits
    Release {
        #[arg(long, help = "Preview decisions without changing anything")]
        dry_run: bool,

        #[arg(long, help = "Push the current branch and tags after tagging")]
        push: bool,

        #[arg(long, default_value = "origin", help = "Remote to push to")]
        remote: String,

        #[arg(
            long = "git.username",
            value_name = "NAME",
            help = "Author name of the release commit"
        )]
        git_username: Option<String>,

        #[arg(
            long = "git.email",
            value_name = "EMAIL",
            help = "Author email of the release commit"
        )]
        git_email: Option<String>,

        #[arg(short, long, help = "Custom configuration file path")]
        config: Option<PathBuf>,
    },
    /// Write a release.toml listing the projects found below the current directory
    Init {
        #[arg(short, long, help = "Overwrite an existing release.toml")]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Write to stderr so logs don't interfere with progress output
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = execute(cli.command) {
        match e.downcast_ref::<ReleaseError>() {
            Some(release_error) => report_failure(release_error),
            None => ui::display_error(&e.to_string()),
        }
        process::exit(1);
    }
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Release {
            dry_run,
            push,
            remote,
            git_username,
            git_email,
            config,
        } => {
            let args = ReleaseWorkflowArgs {
                config_path: config,
                dry_run,
                push,
                remote,
                git_username,
                git_email,
            };

            if args.dry_run {
                ui::display_status("Dry run: no files, commits or tags will be changed");
            }
            let report = run_release_workflow(&args)?;
            ui::display_summary(&report);
        }
        Command::Init { force } => {
            let root = std::env::current_dir()?;
            let result = run_init_workflow(&root, force)?;
            ui::display_success(&format!(
                "Wrote {} with {} project(s)",
                result.path.display(),
                result.config.projects.len()
            ));
            for project in &result.config.projects {
                println!("  {}", project);
            }
        }
    }
    Ok(())
}

fn report_failure(error: &ReleaseError) {
    let headline = match error.kind() {
        ErrorKind::Configuration => "Configuration problem",
        ErrorKind::Version => "Invalid project version; release aborted",
        ErrorKind::HistoryInconsistency => "Inconsistent release history; release aborted",
        ErrorKind::RepositoryOperation => "Repository operation failed during release",
    };
    ui::display_error(&format!("{}: {}", headline, error));
}
