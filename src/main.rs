use clap::{Arg, Command};
use cms_translate::settings::PluginParameters;
use cms_translate::{FieldOutcome, FieldTranslationSession, TranslationFormat, TranslationService};
use serde_json::{Map, Value};
use std::env;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

/// Record key the CLI stores the document under
const FIELD: &str = "document";

async fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        Ok(input)
    } else {
        tokio::fs::read_to_string(path).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("cms-translate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate CMS content between locales")
        .arg(
            Arg::new("input")
                .help("File with the document to translate, or - for stdin")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .short('t')
                .help("Target locales, comma separated (e.g., fr,de)")
                .required(true)
                .value_delimiter(','),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .short('f')
                .help("Source locale (default: en)")
                .default_value("en"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("text, html, markdown, seo, slug, structured-text or rich-text")
                .default_value("text"),
        )
        .arg(
            Arg::new("service")
                .long("service")
                .short('s')
                .help("mock, yandex, deepl, deepl-free or openai (default: from settings, then yandex)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .short('k')
                .help("API key for the service (default: the service's environment variable)"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .help("JSON file with plugin parameters"),
        )
        .arg(
            Arg::new("convert-currency")
                .long("convert-currency")
                .help("Convert currency amounts to each target locale's currency (OpenAI only)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator instead of a real service")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every translated string")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let input_path = matches.get_one::<String>("input").ok_or("missing input")?;
    let from = matches
        .get_one::<String>("from")
        .cloned()
        .unwrap_or_else(|| "en".to_string());
    let targets: Vec<String> = matches
        .get_many::<String>("to")
        .into_iter()
        .flatten()
        .map(|locale| locale.trim().to_string())
        .filter(|locale| !locale.is_empty() && *locale != from)
        .collect();
    if targets.is_empty() {
        eprintln!("❌ No target locale other than the source locale ({})", from);
        std::process::exit(2);
    }

    let format_name = matches.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    let Some(format) = TranslationFormat::from_cli_name(format_name) else {
        eprintln!("❌ Unknown format: {}", format_name);
        std::process::exit(2);
    };

    let mut params = match matches.get_one::<String>("settings") {
        Some(path) => serde_json::from_str::<PluginParameters>(&tokio::fs::read_to_string(path).await?)?,
        None => PluginParameters::default(),
    };
    if let Some(name) = matches.get_one::<String>("service") {
        let Some(service) = TranslationService::from_cli_name(name) else {
            eprintln!("❌ Unknown service: {}", name);
            std::process::exit(2);
        };
        params = params.with_service(service);
    }
    let service = params.selected_service();
    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .or_else(|| service.env_var().and_then(|var| env::var(var).ok()));
    if let Some(api_key) = api_key {
        params = params.with_api_key(service, &api_key);
    }

    let use_mock = matches.get_flag("mock") || service == TranslationService::Mock;
    let mut locales = vec![from.clone()];
    locales.extend(targets.iter().cloned());
    let session = FieldTranslationSession::new(params, locales, format).use_mock(use_mock);

    if let Some(message) = session.configuration_error() {
        eprintln!("❌ {}", message);
        if let Some(var) = service.env_var() {
            eprintln!("   Pass --api-key, set {}, or use --mock", var);
        }
        std::process::exit(1);
    }

    let input = read_input(input_path).await?;
    let document = if format.is_string() {
        Value::String(input)
    } else {
        serde_json::from_str(&input)?
    };

    let mut localized = Map::new();
    localized.insert(from.clone(), document);
    let mut record = Value::Object(Map::from_iter([(FIELD.to_string(), Value::Object(localized))]));
    let convert_currency = matches.get_flag("convert-currency");
    match session
        .translate_field(&mut record, FIELD, &targets, Some(&from), convert_currency)
        .await
    {
        Ok(FieldOutcome::Translated(_)) => {}
        Ok(FieldOutcome::AlreadyRunning) => {
            eprintln!("❌ A translation of this document is already running");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    let output: Map<String, Value> = targets
        .iter()
        .map(|locale| (locale.clone(), record[FIELD][locale.as_str()].clone()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);

    Ok(())
}
