use clap::{Args, Subcommand};

/// Result files shared by every command that works on loaded results.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    #[arg(long, help = "Results file (CSV)")]
    pub results: String,

    #[arg(long, help = "Reference code list to cross-check results against (CSV)")]
    pub reference: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate results without contacting the marketplace
    Validate {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Approve or reject every classified assignment
    Approve {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long, help = "Feedback for assignments that carry none")]
        feedback: Option<String>,
    },
    /// Grant the bonus of every record with a positive amount
    Bonus {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long, help = "Reason shown to workers; per-record reasons win")]
        reason: String,
    },
    /// Assign qualifications to workers
    Qualify {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Approve, grant bonuses and assign qualifications in one run
    Results {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long)]
        approve: bool,

        #[arg(long)]
        bonus: bool,

        #[arg(long)]
        qualify: bool,

        #[arg(long, help = "Bonus reason (requires --bonus)")]
        reason: Option<String>,

        #[arg(long, help = "Default feedback (requires --approve)")]
        feedback: Option<String>,
    },
    /// Message up to 100 workers
    Notify {
        #[arg(long, value_delimiter = ',', num_args = 1.., help = "Comma-separated WorkerIds")]
        workers: Vec<String>,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        message: String,
    },
    /// Add assignments to a HIT and/or extend its lifetime
    ExtendHit {
        #[arg(long, help = "HIT to extend; defaults to HITId from the settings")]
        hit_id: Option<String>,

        #[arg(long, default_value_t = 0)]
        assignments: u32,

        #[arg(long, default_value_t = 0, help = "Seconds from now until expiration")]
        seconds: u64,
    },
    /// Expire a HIT immediately
    ExpireHit {
        #[arg(long, help = "HIT to expire; defaults to HITId from the settings")]
        hit_id: Option<String>,
    },
    /// List your HITs
    SearchHits,
    /// Search qualification types you own
    SearchQualifications {
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Show the account balance
    Balance,
    /// Create a HIT from a JSON parameter file
    CreateHit {
        #[arg(long, help = "JSON file with the HIT parameters")]
        params: String,
    },
}

impl Commands {
    /// Whether the command talks to the marketplace.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Commands::Validate { .. })
    }
}
