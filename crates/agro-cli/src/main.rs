// ============================================================================
// agro — CLI front-end for the AgroLedger assistant
// ============================================================================
// Usage:
//   agro verify [--account ID --key KEY]     Verify Hedera credentials
//   agro topics ACCOUNT [--current TOPIC]    List topics linked to an account
//   agro records TOPIC [--limit N --decoded] List messages stored on a topic
//   agro query "TEXT" [--topic TOPIC]        Process a natural-language query
// ============================================================================

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use agro_core::{
    AgroConfig, AgroService, MirrorNodeClient, OpenRouterClient, QueryRequest, TopicSession,
    UnconfiguredWriter,
};

/// AgroLedger farm assistant
#[derive(Parser)]
#[command(name = "agro", version, about = "Farm assistant backed by Hedera consensus topics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify Hedera credentials against the mirror node
    Verify {
        /// Account ID (default: HEDERA_ACCOUNT_ID)
        #[arg(long)]
        account: Option<String>,

        /// Private key (default: HEDERA_PRIVATE_KEY)
        #[arg(long)]
        key: Option<String>,
    },

    /// List topics linked to an account
    Topics {
        /// Account to reconcile topics for
        account: String,

        /// Currently active topic, surfaced first in the listing
        #[arg(long)]
        current: Option<String>,
    },

    /// List messages stored on a topic
    Records {
        /// Topic to read
        topic: String,

        /// Maximum number of messages to retrieve
        #[arg(long, default_value = "100")]
        limit: u32,

        /// Decode envelopes instead of printing raw payloads
        #[arg(long)]
        decoded: bool,
    },

    /// Process one natural-language query
    Query {
        /// The query text
        text: String,

        /// Topic to read from and store to
        #[arg(long)]
        topic: Option<String>,

        /// Print the full result as JSON instead of the answer text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agro_core=info".parse().unwrap())
                .add_directive("agro_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = AgroConfig::from_env();

    match cli.command {
        Commands::Verify { account, key } => cmd_verify(&config, account, key).await,
        Commands::Topics { account, current } => cmd_topics(&config, &account, current).await,
        Commands::Records {
            topic,
            limit,
            decoded,
        } => cmd_records(&config, &topic, limit, decoded).await,
        Commands::Query { text, topic, json } => cmd_query(&config, &text, topic, json).await,
    }
}

/// Build the service from config. The completion client is only required on
/// the query path; other commands run against the mirror node alone.
fn build_service(
    config: &AgroConfig,
    with_completion: bool,
) -> Result<AgroService<OpenRouterClient, UnconfiguredWriter>> {
    let mirror = Arc::new(MirrorNodeClient::new(config.mirror_base_url.clone()));

    let api_key = if with_completion {
        config
            .openrouter_api_key
            .clone()
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY is not set"))?
    } else {
        String::new()
    };
    let completion = OpenRouterClient::new(api_key, config.completion_model.clone());

    Ok(AgroService::new(
        mirror,
        config.fallback_topics.clone(),
        completion,
        UnconfiguredWriter,
    ))
}

async fn cmd_verify(
    config: &AgroConfig,
    account: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let operator = config.operator.clone();
    let account = account
        .or_else(|| operator.as_ref().map(|o| o.account_id.clone()))
        .ok_or_else(|| anyhow!("No account: pass --account or set HEDERA_ACCOUNT_ID"))?;
    let key = key
        .or_else(|| operator.map(|o| o.private_key))
        .ok_or_else(|| anyhow!("No key: pass --key or set HEDERA_PRIVATE_KEY"))?;

    let service = build_service(config, false)?;
    match service.verify_credentials(&account, &key).await {
        Ok(()) => {
            println!("Credentials validated successfully");
            println!("  Account ID: {}", account);
            Ok(())
        }
        Err(e) => {
            eprintln!("Credential verification failed: {}", e);
            eprintln!();
            eprintln!("Troubleshooting:");
            eprintln!("1. Ensure a .env file exists with HEDERA_ACCOUNT_ID and HEDERA_PRIVATE_KEY");
            eprintln!("2. Check the private key format (hex, raw or DER)");
            eprintln!("3. Confirm the account exists on the configured network");
            Err(e.into())
        }
    }
}

async fn cmd_topics(config: &AgroConfig, account: &str, current: Option<String>) -> Result<()> {
    let service = build_service(config, false)?;
    let topics = service.discover_topics(account, current.as_deref()).await;

    if topics.is_empty() {
        println!("No topics found for account {}", account);
        return Ok(());
    }

    println!("=== Topics for account {} ===", account);
    for topic in topics {
        let mut flags = Vec::new();
        if topic.is_current {
            flags.push("current");
        }
        if topic.is_created_by_you {
            flags.push("created by you");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!("{}  {}  (created {}){}", topic.topic_id, topic.memo, topic.created, flags);
    }
    Ok(())
}

async fn cmd_records(config: &AgroConfig, topic: &str, limit: u32, decoded: bool) -> Result<()> {
    let service = build_service(config, false)?;

    if decoded {
        let entries = service.list_entries(topic, limit).await?;
        info!("{} decodable entries on topic {}", entries.len(), topic);
        println!("{}", agro_core::prompts::format_entries(&entries));
        return Ok(());
    }

    let records = service.list_records(topic, limit).await?;
    for record in records {
        println!("[{}] {}", record.timestamp, record.contents);
    }
    Ok(())
}

async fn cmd_query(config: &AgroConfig, text: &str, topic: Option<String>, json: bool) -> Result<()> {
    let service = build_service(config, true)?;

    let session = TopicSession::new();
    if let Some(topic) = topic {
        session.set(topic);
    }

    let request = QueryRequest {
        query: text.to_string(),
        topic_id: session.snapshot(),
        credentials: config.operator.clone(),
    };

    let result = service.process_query(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", result.answer);

    if result.stored_in_blockchain == Some(true) {
        if let Some(topic_id) = &result.topic_id {
            println!();
            println!("(stored on topic {})", topic_id);
        }
    }
    if result.no_topic_available == Some(true) {
        println!();
        println!("(no topic available: set one with --topic to store this on the ledger)");
    }
    Ok(())
}
