//! Command-line entry point (§4.I, §6.6): clap derive shape grounded on the
//! teacher's `cli::args::Cli`/`Commands`, cut down to this crate's seven
//! subcommands.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agent-tracker", version, about = "Tracks and verifies parallel-phase execution of the agent pipeline")]
pub struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override project root discovery (§6.2).
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record an agent's start (§4.C).
    Start {
        agent: String,
        /// Remaining words are joined with spaces to form the message.
        message: Vec<String>,
    },
    /// Record an agent's completion; idempotent on repeat (§4.C).
    Complete {
        agent: String,
        message: Vec<String>,
        /// Comma-separated tool identifiers, e.g. `--tools Read,Edit`.
        #[arg(long)]
        tools: Option<String>,
    },
    /// Record an agent's failure; not idempotent (§4.C).
    Fail { agent: String, message: Vec<String> },
    /// Associate a GitHub issue number with the session.
    SetGithubIssue { issue: i64 },
    /// Print the current display metadata for every expected agent.
    Status,
    /// Classify the two-agent exploration phase (§4.G).
    VerifyParallelExploration,
    /// Classify the three-agent validation phase (§4.G).
    VerifyParallelValidation,
    /// Register the agent named by `CLAUDE_AGENT_NAME`, if any (§4.D).
    AutoTrack { message: Vec<String> },
}
