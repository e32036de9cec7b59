//! `cbap`: run expressions, validation rules, measures and workflow
//! transitions against a JSON snapshot.
//!
//! ```bash
//! cbap eval 'amount > 100 && status == "open"' --context '{"amount": 150, "status": "open"}'
//! cbap --snapshot db.json validate invoice --data '{"name": ""}' --trigger CREATE
//! cbap --snapshot db.json measure tax --param base=100
//! cbap --snapshot db.json transition invoice <record> <transition> --actor carol --save
//! cbap --snapshot db.json audit invoice <record> --verify
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "cbap", version, about)]
struct Cli {
    /// Snapshot holding definitions, records, audit history and roles
    #[arg(long, short = 's', env = "CBAP_SNAPSHOT", value_name = "PATH", global = true)]
    snapshot: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an expression against a JSON context
    Eval {
        expression: String,
        /// JSON object bound as the evaluation context
        #[arg(long, short = 'c', default_value = "{}")]
        context: String,
        /// Coerce the result with the boolean evaluation rules
        #[arg(long)]
        boolean: bool,
    },
    /// Run every applicable validation rule for a record
    Validate {
        entity: String,
        /// Record data as a JSON object
        #[arg(long, short = 'd')]
        data: String,
        #[arg(long, short = 't', default_value = "UPDATE")]
        trigger: String,
        /// Data before the change, as a JSON object
        #[arg(long)]
        previous: Option<String>,
    },
    /// Validate one property with a candidate value
    ValidateField {
        entity: String,
        property: String,
        /// Candidate value as JSON; bare text is taken as a string
        value: String,
        /// Rest of the record as a JSON object
        #[arg(long, short = 'r', default_value = "{}")]
        record: String,
    },
    /// Evaluate a measure
    Measure {
        identifier: String,
        /// Specific version; the latest is used when omitted
        #[arg(long, short = 'v')]
        version: Option<i32>,
        /// Parameter as NAME=VALUE (repeatable)
        #[arg(long = "param", short = 'p', value_name = "NAME=VALUE", value_parser = commands::parse_param)]
        params: Vec<(String, Value)>,
    },
    /// List the stored versions of a measure
    Versions { identifier: String },
    /// List transitions available from a record's current state
    Transitions { entity: String, record: Uuid },
    /// Execute a workflow transition
    Transition {
        entity: String,
        record: Uuid,
        transition: Uuid,
        #[arg(long, short = 'a', env = "CBAP_ACTOR")]
        actor: String,
        #[arg(long)]
        comments: Option<String>,
        /// Write the updated snapshot back to its file
        #[arg(long)]
        save: bool,
    },
    /// Show a record's workflow audit log, newest first
    Audit {
        entity: String,
        record: Uuid,
        /// Recompute the integrity hash chain
        #[arg(long)]
        verify: bool,
    },
    /// Compute calculated properties for record data
    Calc {
        entity: String,
        #[arg(long, short = 'd')]
        data: String,
        /// Parent record as a JSON object
        #[arg(long)]
        parent: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let json_logs = cli.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cbap_cli=info,cbap_core=info,cbap_db=info".into()),
        )
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let config = cbap_core::config::EngineConfig::from_env();
    tracing::debug!(
        max_expression_length = config.max_expression_length,
        max_expression_depth = config.max_expression_depth,
        "Engine configuration loaded",
    );

    commands::run(cli, config)
}
