use clap::{Parser, Subcommand};
use std::sync::Arc;

use api_shared::{sign, HealthService, SignatureMethod};
use messenger::{EventKind, InboundEvent, OutboundMessage};
use symbot_core::constants::DEFAULT_SYMPTOM_CHECKER_URL;
use symbot_core::render::subtitle;
use symbot_core::{
    parse_diagnoses, DiagnosisLookupClient, DiagnosisQuery, Dispatcher, LookupConfig,
    ReqwestFetcher,
};

#[derive(Parser)]
#[command(name = "symbot")]
#[command(about = "Symptom checker chatbot CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the service reports healthy
    Health,
    /// Dispatch a text message and print the Send API requests it produces
    Say {
        /// Message text as typed by the user
        text: String,
        /// Sender id to address replies to
        #[arg(long, default_value = "CLI_USER")]
        sender: String,
    },
    /// Dispatch a postback and print the Send API requests it produces
    Postback {
        /// Postback payload, e.g. FEMALE_PAYLOAD
        payload: String,
        /// Sender id to address replies to
        #[arg(long, default_value = "CLI_USER")]
        sender: String,
    },
    /// Query the symptom checker and list the diagnoses
    Lookup {
        /// Comma-separated symptoms
        symptoms: String,
    },
    /// Print the signature header for a webhook body
    Sign {
        /// File containing the raw request body
        file: std::path::PathBuf,
        /// App secret (defaults to MESSENGER_APP_SECRET)
        #[arg(long)]
        secret: Option<String>,
        /// Produce a legacy X-Hub-Signature (sha1) value
        #[arg(long)]
        sha1: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Health) => {
            let res = HealthService::check_health();
            println!("ok: {}, message: {}", res.ok, res.message);
        }
        Some(Commands::Say { text, sender }) => {
            let kind = EventKind::Text {
                message_id: "cli".into(),
                text,
            };
            print_replies(&dispatch(sender, kind).await)?;
        }
        Some(Commands::Postback { payload, sender }) => {
            let kind = EventKind::PostbackTap {
                title: None,
                payload,
            };
            print_replies(&dispatch(sender, kind).await)?;
        }
        Some(Commands::Lookup { symptoms }) => {
            let config = match LookupConfig::from_lookup(&|key: &str| std::env::var(key).ok()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error reading symptom checker settings: {}", e);
                    return Ok(());
                }
            };
            let query = match DiagnosisQuery::from_text(&symptoms, &config) {
                Ok(query) => query,
                Err(e) => {
                    eprintln!("Error building query: {}", e);
                    return Ok(());
                }
            };

            let client =
                DiagnosisLookupClient::new(config.clone(), Arc::new(ReqwestFetcher::new()));
            let raw = match client.lookup(&query).await {
                Ok(raw) => raw,
                Err(e) => {
                    eprintln!("Error querying symptom checker: {}", e);
                    return Ok(());
                }
            };

            match parse_diagnoses(&raw, &config.detail_search_url) {
                Ok(conditions) if conditions.is_empty() => println!("No diagnoses found."),
                Ok(conditions) => {
                    for condition in conditions {
                        println!(
                            "{} | {} | {}",
                            condition.name,
                            subtitle(&condition),
                            condition.detail_url
                        );
                    }
                }
                Err(e) => eprintln!("Error reading symptom checker response: {}", e),
            }
        }
        Some(Commands::Sign { file, secret, sha1 }) => {
            let secret = secret.or_else(|| std::env::var("MESSENGER_APP_SECRET").ok());
            let Some(secret) = secret else {
                eprintln!("Error: pass --secret or set MESSENGER_APP_SECRET");
                return Ok(());
            };
            let body = std::fs::read(&file)?;
            let method = if sha1 {
                SignatureMethod::Sha1
            } else {
                SignatureMethod::Sha256
            };
            println!("{}", sign(method, &body, &secret)?);
        }
        None => {
            println!("Use 'symbot --help' for commands");
        }
    }

    Ok(())
}

/// Run one event through the dispatcher without sending anything.
///
/// Lookups use the symptom checker settings from the environment when they are complete;
/// otherwise symptom queries fall back to the apology reply.
async fn dispatch(sender: String, kind: EventKind) -> Vec<OutboundMessage> {
    let config = LookupConfig::from_lookup(&|key: &str| std::env::var(key).ok())
        .unwrap_or_else(|e| {
            eprintln!("note: {}; symptom lookups will fail", e);
            LookupConfig::new(DEFAULT_SYMPTOM_CHECKER_URL, "", "")
        });
    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:5000".into());

    let dispatcher = Dispatcher::new(
        server_url,
        DiagnosisLookupClient::new(config, Arc::new(ReqwestFetcher::new())),
    );
    let event = InboundEvent {
        sender_id: sender,
        recipient_id: "CLI_PAGE".into(),
        timestamp: 0,
        kind,
    };
    dispatcher.dispatch(&event).await
}

fn print_replies(replies: &[OutboundMessage]) -> Result<(), Box<dyn std::error::Error>> {
    if replies.is_empty() {
        println!("(no reply)");
    }
    for reply in replies {
        println!("{}", serde_json::to_string_pretty(&reply.to_send_request()?)?);
    }
    Ok(())
}
