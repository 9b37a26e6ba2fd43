use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "crowdsignal", about = "Community-vetted recommendations and trading signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a recommendation for community vetting
    Submit {
        /// Submitter user id
        submitter_id: String,
        /// Submitter display name
        submitter_name: String,
        /// JSON with asset_type, symbol, name, current_price, price_change_pct, direction,
        /// reasoning, target_price, time_horizon, risk_level, analysis
        json: String,
    },
    /// Vote on a recommendation
    Vote {
        recommendation_id: String,
        voter_id: String,
        /// up or down
        direction: String,
        /// Override the voter's ledger reputation
        #[arg(long)]
        reputation: Option<f64>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show a recommendation
    Show { id: String },
    /// List recommendations open for voting
    Queue {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only items with no votes yet
        #[arg(long)]
        pending: bool,
    },
    /// List a user's recommendations
    History {
        submitter_id: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Convert an approved recommendation into a signal (idempotent)
    Convert { recommendation_id: String },
    /// List active signals
    Signals {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Subscribe a user to a signal
    SignalSubscribe { signal_id: String, user_id: String },
    /// Unsubscribe a user from a signal
    SignalUnsubscribe { signal_id: String, user_id: String },
    /// Close a signal (triggered, expired, cancelled)
    SignalClose {
        signal_id: String,
        status: String,
        /// JSON with entry_price, exit_price, actual_return, hit_target, hit_stop_loss
        #[arg(long)]
        json: Option<String>,
    },
    /// Show a user's reputation
    Reputation { user_id: String },
    /// Top users by reputation score
    Leaderboard {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Adjust a user's follower count
    Follow {
        user_id: String,
        /// Change in followers (negative to remove)
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Expire stale recommendations and signals once
    Sweep,
    /// Run the expiry sweep on an interval until interrupted
    Watch {
        /// Seconds between sweeps (defaults to CROWDSIGNAL_SWEEP_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
}
