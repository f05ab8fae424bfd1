use std::fmt;

use carepanion_core::config::{AttestationConfig, DEFAULT_DATABASE_URL, DEFAULT_RPC_URL};
use carepanion_core::model::RatingRequest;
use carepanion_core::retry::RetryPolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "carepanion", version, about = "Carepanion rating attestation CLI")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs to stderr as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Process configuration, read from flags or the environment.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Solana RPC endpoint.
    #[arg(long, global = true, env = "SOLANA_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Base58 id of the label program. Unset disables ledger submission.
    #[arg(long, global = true, env = "SOLANA_PROGRAM_ID")]
    pub program_id: Option<String>,

    /// Treasury secret key as a JSON byte array.
    #[arg(long, global = true, env = "TREASURY_PRIVATE_KEY", hide_env_values = true)]
    pub treasury_key: Option<String>,

    /// SQLite database path (a `sqlite:///` prefix is accepted).
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Submission attempts when the ledger does not answer.
    #[arg(long, global = true, env = "CAREPANION_MAX_ATTEMPTS", default_value_t = 2)]
    pub max_attempts: u32,
}

impl ConfigArgs {
    pub fn to_config(&self) -> AttestationConfig {
        AttestationConfig {
            rpc_url: self.rpc_url.clone(),
            program_id: self.program_id.clone().filter(|s| !s.trim().is_empty()),
            treasury_key_json: self.treasury_key.clone().filter(|s| !s.trim().is_empty()),
            database_url: database_path(&self.database_url).to_string(),
            retry: RetryPolicy::default().with_max_attempts(self.max_attempts),
        }
    }
}

impl fmt::Debug for ConfigArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigArgs")
            .field("rpc_url", &self.rpc_url)
            .field("program_id", &self.program_id)
            .field("treasury_key", &self.treasury_key.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

fn database_path(url: &str) -> &str {
    url.strip_prefix("sqlite:///").unwrap_or(url)
}

#[derive(Args, Debug, Clone)]
pub struct RatingArgs {
    /// Catalog id of the rated clip.
    #[arg(long)]
    pub audio_id: u64,

    /// Comfort level, 1 to 5.
    #[arg(long)]
    pub comfort: i64,

    /// Clarity, 1 to 5.
    #[arg(long)]
    pub clarity: i64,

    /// Slow | Medium | Fast
    #[arg(long)]
    pub speaking_rate: String,

    /// Low | Medium | High
    #[arg(long)]
    pub empathy: String,

    #[arg(long)]
    pub notes: Option<String>,
}

impl From<RatingArgs> for RatingRequest {
    fn from(a: RatingArgs) -> Self {
        RatingRequest {
            audio_id: a.audio_id,
            comfort_level: a.comfort,
            clarity: a.clarity,
            speaking_rate: a.speaking_rate,
            perceived_empathy: a.empathy,
            notes: a.notes,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Attest a rating on the ledger and record it.
    Submit {
        /// Participant public key (base58).
        #[arg(long)]
        participant: String,

        #[command(flatten)]
        rating: RatingArgs,
    },

    /// Show the next clip a participant has not rated.
    NextAudio {
        #[arg(long)]
        participant: String,
    },

    /// Register an audio clip in the catalog.
    AddAudio {
        file_url: String,

        #[arg(long)]
        duration: Option<u32>,
    },

    /// List a participant's recorded labels.
    Labels {
        #[arg(long)]
        participant: String,
    },

    /// Print the per-participant program address.
    Derive {
        #[arg(long)]
        participant: String,
    },

    /// Hash a rating and print the instruction payload without submitting.
    Encode {
        #[command(flatten)]
        rating: RatingArgs,
    },

    /// Check configuration, storage and ledger connectivity.
    Doctor {
        /// Skip the RPC round trip.
        #[arg(long)]
        offline: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("carepanion").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn submit_flags_map_to_request() {
        let cli = parse(&[
            "submit",
            "--participant",
            "11111111111111111111111111111111",
            "--audio-id",
            "44",
            "--comfort",
            "5",
            "--clarity",
            "4",
            "--speaking-rate",
            "Fast",
            "--empathy",
            "High",
        ]);
        let Command::Submit { rating, .. } = cli.command else {
            panic!("expected submit");
        };
        let req = RatingRequest::from(rating);
        assert_eq!(req.audio_id, 44);
        assert_eq!(req.comfort_level, 5);
        assert_eq!(req.perceived_empathy, "High");
        assert_eq!(req.notes, None);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["doctor", "--offline", "--json", "--max-attempts", "4"]);
        assert!(cli.json);
        assert_eq!(cli.config.to_config().retry.max_attempts, 4);
    }

    #[test]
    fn sqlite_url_prefix_is_stripped() {
        let cli = parse(&["--database-url", "sqlite:///./labels.db", "doctor"]);
        assert_eq!(cli.config.to_config().database_url, "./labels.db");
    }

    #[test]
    fn blank_program_id_disables_submission() {
        let cli = parse(&["--program-id", " ", "doctor"]);
        assert!(!cli.config.to_config().submission_enabled());
    }

    #[test]
    fn debug_redacts_treasury_key() {
        let cli = parse(&["--treasury-key", "[1,2,3]", "doctor"]);
        let shown = format!("{:?}", cli.config);
        assert!(!shown.contains("[1,2,3]"));
        assert!(shown.contains("<redacted>"));
    }
}
