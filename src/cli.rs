use clap::{Parser, Subcommand};

/// viewguard - content-gating agent for hosted media pages.
#[derive(Parser, Debug)]
#[command(name = "viewguard")]
#[command(version = "0.1.0")]
#[command(about = "Gate media content behind approval verdicts.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the coordinator: periodic approval-store housekeeping
    Run,

    /// Drive a full gate cycle against a simulated page (agent + overrides)
    Demo {
        /// Address of the content to gate
        url: String,
    },

    /// Fetch a verdict for an address and print it
    Check {
        /// Address of the content to analyze
        url: String,

        /// Also record the verdict in the approval store
        #[arg(long)]
        apply: bool,
    },

    /// Report whether an address's content is approved in the store
    Status {
        /// Address to look up
        url: String,
    },

    /// Record an approval for an address (takes effect on next visit)
    Approve { url: String },

    /// Remove an address's approval record
    Block { url: String },

    /// Inspect or reset the approval store
    Approvals {
        #[command(subcommand)]
        command: ApprovalsCommands,
    },

    /// Probe the analysis service and report reachability
    Health,
}

#[derive(Subcommand, Debug)]
pub enum ApprovalsCommands {
    /// List approved content identifiers, oldest first
    List,
    /// Delete every approval record
    Clear,
}
