use std::env;
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use clap::{Arg, Command};
use log::info;

mod error;
mod handlers;
mod models;
mod services;
mod utils;

use handlers::{generate, timing, tts, users, vocabulary, words};
use models::{AppState, RuntimeSettings, TtsSettings};
use services::frequency::{FrequencyDictionary, DEFAULT_SAFE_WORDS_COUNT};
use services::ledger::VocabularyLedger;
use services::llm::OpenAiClient;
use services::store::{JsonFileStore, UserStore};

// Function to initialize logging
fn init_logging(log_file: Option<&String>) {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .expect("Failed to open log file");

        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
}

fn fatal(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let matches = Command::new("passaged")
        .version("1.1")
        .about("Passage generation and word-safety service")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .num_args(1)
                .default_value("0.0.0.0:2345")
                .help("Specify the listen address (e.g., 0.0.0.0:2345)"),
        )
        .arg(
            Arg::new("frequency-file")
                .long("frequency-file")
                .num_args(1)
                .default_value("./share/word_frequency_english.txt")
                .help("Two-column word-frequency table"),
        )
        .arg(
            Arg::new("safe-words-count")
                .long("safe-words-count")
                .num_args(1)
                .value_parser(clap::value_parser!(usize))
                .default_value("10000")
                .help("Number of top-frequency words treated as safe"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .num_args(1)
                .default_value("./data")
                .help("Directory for the per-user JSON documents"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("generation-deadline-secs")
                .long("generation-deadline-secs")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("30")
                .help("Deadline for a whole generation pipeline, retries included"),
        )
        .arg(
            Arg::new("model-timeout-secs")
                .long("model-timeout-secs")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("20")
                .help("Timeout for a single model call"),
        )
        .get_matches();

    let listen_host = matches
        .get_one::<String>("listen-host")
        .expect("listen-host argument must always have a default value")
        .clone();
    let frequency_file = matches.get_one::<String>("frequency-file").unwrap();
    let safe_words_count = *matches
        .get_one::<usize>("safe-words-count")
        .unwrap_or(&DEFAULT_SAFE_WORDS_COUNT);
    let data_dir = matches.get_one::<String>("data-dir").unwrap();
    let log_file = matches.get_one::<String>("log-file");
    let generation_deadline = *matches.get_one::<u64>("generation-deadline-secs").unwrap();
    let model_timeout = *matches.get_one::<u64>("model-timeout-secs").unwrap();

    init_logging(log_file);

    // Dictionary load failure is fatal: without the safe set, hide-mode
    // generation cannot work at all.
    let dictionary = FrequencyDictionary::load(frequency_file, safe_words_count)?;

    let api_key = env::var("OPENAI_API_KEY")
        .map_err(|_| fatal("OPENAI_API_KEY environment variable not set".to_string()))?;
    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string());
    let llm = OpenAiClient::new(api_key, model, Duration::from_secs(model_timeout))
        .map_err(|e| fatal(e.to_string()))?;

    let store: Arc<dyn UserStore> =
        Arc::new(JsonFileStore::new(data_dir).map_err(|e| fatal(e.to_string()))?);
    let ledger = VocabularyLedger::new(store.clone());

    let state = AppState {
        dictionary: Arc::new(dictionary),
        store,
        ledger,
        llm: Arc::new(llm),
        settings: RuntimeSettings {
            generation_deadline: Duration::from_secs(generation_deadline),
            tts: TtsSettings {
                api_key: env::var("ELEVENLABS_API_KEY").ok(),
                voice_id: env::var("ELEVENLABS_VOICE_ID")
                    .unwrap_or_else(|_| "EXAVITQu4vr4xnSDxMaL".to_string()),
                request_timeout: Duration::from_secs(12),
                max_chars: 1000,
            },
        },
    };
    let shared_state = web::Data::new(state);

    info!("Listening on {}", listen_host);

    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .service(generate::generate_passage)
            .service(words::word_frequency)
            .service(words::update_problem_words)
            .service(timing::record_passage_timing)
            .service(vocabulary::clear_vocabulary)
            .service(users::create_user)
            .service(users::get_user)
            .service(tts::synthesize_speech)
    })
    .bind(&listen_host)?
    .run()
    .await
}
