//! Command-line interface.
//!
//! ## Commands
//!
//! - `watch [TEST...]` - follow live results pushed over the websocket
//! - `run TEST...` - run tests and report the score
//! - `submit --description D --test DESC=PATH...` - upload a task's tests
//! - `scoreboard` - print the launch's scoreboard

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Client for the LTI test-grading page
#[derive(Parser, Debug)]
#[command(name = "lti-grader")]
#[command(version, about = "Client for the LTI test-grading page", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "LTI_GRADER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow live results until the server closes the connection
    Watch {
        /// Test rows shown on the page
        #[arg(value_name = "TEST")]
        tests: Vec<String>,
    },

    /// Run tests on the student's machine and report the score
    Run {
        /// Tests to run, in page order
        #[arg(value_name = "TEST", required = true)]
        tests: Vec<String>,
    },

    /// Upload the task description and its test files
    Submit {
        /// Task description
        #[arg(long)]
        description: String,
        /// One test row, repeatable
        #[arg(long = "test", value_name = "DESC=PATH", required = true, value_parser = parse_test_spec)]
        tests: Vec<TestSpec>,
    },

    /// Print grades of every member of the launch's context
    Scoreboard,
}

/// A `--test` argument: row description and the file to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    pub description: String,
    pub path: PathBuf,
}

fn parse_test_spec(raw: &str) -> Result<TestSpec, String> {
    let (description, path) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected DESC=PATH, got '{raw}'"))?;
    if description.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected DESC=PATH, got '{raw}'"));
    }
    Ok(TestSpec {
        description: description.to_string(),
        path: PathBuf::from(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["lti-grader", "run", "build", "lint"]).unwrap();
        match cli.command {
            Command::Run { tests } => assert_eq!(tests, ["build", "lint"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_tests() {
        assert!(Cli::try_parse_from(["lti-grader", "run"]).is_err());
    }

    #[test]
    fn test_parse_submit_with_global_config() {
        let cli = Cli::try_parse_from([
            "lti-grader",
            "submit",
            "--description",
            "Lab 1",
            "--test",
            "a = b=checks/a.sh",
            "--test",
            "lint=lint.sh",
            "--config",
            "grader.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("grader.toml")));
        let Command::Submit { description, tests } = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(description, "Lab 1");
        assert_eq!(tests[0].description, "a = b");
        assert_eq!(tests[0].path, PathBuf::from("checks/a.sh"));
        assert_eq!(tests[1].description, "lint");
    }

    #[test]
    fn test_bad_test_spec() {
        assert!(parse_test_spec("no-separator").is_err());
        assert!(parse_test_spec("=x").is_err());
    }
}
