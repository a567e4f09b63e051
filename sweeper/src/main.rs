//! Stack sweeper CLI.
//!
//! Lists root stacks in one region, selects those past their expiry tag or
//! not updated for a number of days, and deletes them when `--delete` is
//! given. Without `--delete` the run only reports what it would remove.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::TimeDelta;
use clap::{ArgGroup, Parser};
use tracing::{debug, error, info};

use stack_sweeper::core::criteria::SweepCriteria;
use stack_sweeper::exit_codes;
use stack_sweeper::io::aws_cli::AwsCliCloudFormation;
use stack_sweeper::io::config::{DEFAULT_CONFIG_FILE, load_config};
use stack_sweeper::io::lifecycle::log_event;
use stack_sweeper::logging;
use stack_sweeper::sweep::{SweepOptions, run_sweep};

const DEFAULT_REGION: &str = "ap-southeast-2";

#[derive(Parser, Debug)]
#[command(
    name = "stack-sweeper",
    version,
    about = "Finds (and optionally deletes) stacks that meet certain age criteria"
)]
#[command(group(
    ArgGroup::new("age")
        .args(["expiry_tag", "stack_update_age"])
        .required(true)
        .multiple(true)
))]
struct Cli {
    /// The tag name that contains the stack's expiry.
    #[arg(long, value_name = "TAG")]
    expiry_tag: Option<String>,

    /// The tag name that excludes the stack from consideration.
    #[arg(long, value_name = "TAG")]
    exclude_tag: Option<String>,

    /// Stack names to exclude from consideration.
    #[arg(long, value_name = "NAME", num_args = 1..)]
    exclude_stacks: Vec<String>,

    /// Stack name prefixes to exclude from consideration.
    #[arg(long, value_name = "PREFIX", num_args = 1..)]
    exclude_stack_prefixes: Vec<String>,

    /// Number of days since the last stack update.
    #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..))]
    stack_update_age: Option<u32>,

    /// Maximum number of stacks to delete.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    limit: Option<u32>,

    /// The log level to display.
    #[arg(long, value_name = "LEVEL", default_value = "INFO")]
    log_level: String,

    /// Delete the identified stacks.
    #[arg(long)]
    delete: bool,

    /// Remove stacks even when termination protection is enabled.
    #[arg(long, requires = "delete")]
    disable_termination_protection: bool,

    /// Do not wait for each delete to finish.
    #[arg(long, requires = "delete")]
    no_wait: bool,

    /// Region to sweep.
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Named credentials profile.
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Path to the sweeper config file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

impl Cli {
    fn criteria(&self) -> SweepCriteria {
        SweepCriteria {
            expiry_tag: self.expiry_tag.clone(),
            update_age: self
                .stack_update_age
                .map(|days| TimeDelta::days(i64::from(days))),
            exclude_tag: self.exclude_tag.clone(),
            exclude_names: self.exclude_stacks.clone(),
            exclude_name_prefixes: self.exclude_stack_prefixes.clone(),
            limit: self.limit,
            compare_time: None,
        }
    }

    fn options(&self, poll_interval: std::time::Duration) -> SweepOptions {
        SweepOptions {
            delete: self.delete,
            wait: !self.no_wait,
            disable_termination_protection: self.disable_termination_protection,
            poll_interval,
        }
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    if !cli.delete {
        info!(
            "This is a DRY RUN only. To actually delete stacks, you must add --delete to the execution"
        );
        info!("e.g.: {} --delete", rerun_command(std::env::args()));
    }

    let config = load_config(&cli.config)?;
    let mut strategy = cli.criteria().build_strategy()?;
    debug!("Using strategy configuration: {}", strategy.describe());

    let client = AwsCliCloudFormation::new(&config.aws, cli.region.as_str(), cli.profile.clone());
    let outcome = run_sweep(
        &client,
        &mut strategy,
        &cli.options(config.poll_interval()),
        log_event,
    )?;

    if outcome.has_failures() {
        error!(
            "{} of {} stacks failed to delete",
            outcome.failures.len(),
            outcome.selected.len()
        );
        return Ok(exit_codes::DELETE_FAILED);
    }
    Ok(exit_codes::OK)
}

/// The invocation as typed, with the program reduced to its file name.
fn rerun_command(mut args: impl Iterator<Item = String>) -> String {
    let program = args
        .next()
        .map(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or(arg0)
        })
        .unwrap_or_else(|| "stack-sweeper".to_string());
    std::iter::once(program)
        .chain(args)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_defaults() {
        let cli = Cli::parse_from(["stack-sweeper", "--expiry-tag", "expiry"]);
        assert_eq!(cli.expiry_tag.as_deref(), Some("expiry"));
        assert_eq!(cli.log_level, "INFO");
        assert!(!cli.delete);
        assert!(!cli.no_wait);
        assert!(!cli.disable_termination_protection);
        assert!(cli.exclude_stacks.is_empty());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn parse_full_argument_set() {
        let cli = Cli::parse_from([
            "stack-sweeper",
            "--expiry-tag",
            "expiry",
            "--exclude-tag",
            "exclude",
            "--exclude-stacks",
            "stack-one",
            "stack-two",
            "--exclude-stack-prefixes",
            "prefixone",
            "--stack-update-age",
            "90",
            "--limit",
            "10",
            "--log-level",
            "DEBUG",
            "--delete",
            "--disable-termination-protection",
            "--no-wait",
            "--region",
            "us-east-1",
        ]);
        assert_eq!(cli.exclude_stacks, vec!["stack-one", "stack-two"]);
        assert_eq!(cli.exclude_stack_prefixes, vec!["prefixone"]);
        assert_eq!(cli.region, "us-east-1");

        let criteria = cli.criteria();
        assert_eq!(criteria.update_age, Some(TimeDelta::days(90)));
        assert_eq!(criteria.limit, Some(10));

        let options = cli.options(std::time::Duration::ZERO);
        assert!(options.delete);
        assert!(!options.wait);
        assert!(options.disable_termination_protection);
    }

    #[test]
    fn requires_an_age_criterion() {
        let err = Cli::try_parse_from(["stack-sweeper", "--exclude-tag", "keep"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn delete_modifiers_require_delete() {
        for flag in ["--no-wait", "--disable-termination-protection"] {
            let err =
                Cli::try_parse_from(["stack-sweeper", "--expiry-tag", "expiry", flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument, "{flag}");
        }
    }

    #[test]
    fn rejects_zero_counts() {
        for flag in ["--stack-update-age", "--limit"] {
            let err = Cli::try_parse_from(["stack-sweeper", "--expiry-tag", "expiry", flag, "0"])
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{flag}");
        }
    }

    #[test]
    fn rerun_command_uses_program_file_name() {
        let args = ["/usr/local/bin/stack-sweeper", "--expiry-tag", "expiry"]
            .map(String::from)
            .into_iter();
        assert_eq!(rerun_command(args), "stack-sweeper --expiry-tag expiry");
    }
}
