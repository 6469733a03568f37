use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photopilot_contracts::chat::{
    display_text, extract_action, parse_command, ChatCommand, CHAT_HELP_COMMANDS,
};
use photopilot_contracts::develop::{translate, ContextSnapshot};
use photopilot_contracts::models::{Capability, ModelSelector, ModelSpec, DRYRUN_BACKEND};
use photopilot_contracts::prefs::{resolve_api_key, PrefsStore, PREF_API_KEY, PREF_MODEL};
use photopilot_engine::{
    DevelopHost, GeminiBackend, ModelBackend, ScriptedBackend, Session, SessionConfig,
    SidecarCatalog, TurnOutcome,
};
use serde_json::{json, Value};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DRYRUN_MODEL: &str = "dryrun-text-1";

#[derive(Debug, Parser)]
#[command(name = "photopilot", version, about = "Conversational photo-editing assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat about and edit the photos in a catalog.
    Chat(ChatArgs),
    /// Print the action and translated edit recovered from a model reply.
    Extract(ExtractArgs),
    /// Store the API key in the preferences file.
    SetKey(SetKeyArgs),
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    catalog: PathBuf,
    /// Register and select a photo; repeat for several.
    #[arg(long = "photo")]
    photos: Vec<PathBuf>,
    #[arg(long)]
    prefs: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
    /// Answer from canned replies instead of calling the model service.
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct ExtractArgs {
    /// Reply text file; stdin when omitted.
    input: Option<PathBuf>,
    /// Current temperature of the photo the edit would target.
    #[arg(long, default_value_t = 5500.0, allow_negative_numbers = true)]
    temperature: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    tint: f64,
}

#[derive(Debug, Parser)]
struct SetKeyArgs {
    key: String,
    #[arg(long)]
    prefs: Option<PathBuf>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("photopilot error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Extract(args) => run_extract(args),
        Command::SetKey(args) => run_set_key(args),
    }
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let mut prefs = open_prefs(args.prefs.as_deref())?;
    let mut catalog = SidecarCatalog::open(&args.catalog)?;
    let mut added = Vec::new();
    for photo in &args.photos {
        added.push(catalog.add_photo(photo)?);
    }
    if !added.is_empty() {
        catalog.select(&added)?;
    }

    let requested_model = args.model.clone().or_else(|| prefs.get_string(PREF_MODEL));
    let spec = resolve_model(requested_model.as_deref(), args.dryrun)?;
    let offline = spec.backend == DRYRUN_BACKEND;
    let backend: Box<dyn ModelBackend> = if offline {
        Box::new(ScriptedBackend::dryrun())
    } else {
        Box::new(GeminiBackend::new(resolve_api_key(&mut prefs)))
    };

    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| sibling_path(&args.catalog, "events.jsonl"));
    let summary_path = sibling_path(&events_path, "summary.json");
    let config = SessionConfig {
        model: spec.name,
        ..SessionConfig::default()
    };
    let mut session = Session::new(catalog, backend, &events_path, config)?;

    println!(
        "Photopilot chat started ({}, model {}). Type /help for commands.",
        session.id(),
        session.model()
    );
    if !offline && resolve_api_key(&mut prefs).is_none() {
        println!("No API key yet. Use /key <value> or set GEMINI_API_KEY.");
    }
    print_photos(session.host());

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        if let Err(err) = io::stdout().flush() {
            warn!(error = %err, "stdout closed; ending chat");
            break;
        }

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "stdin read failed; ending chat");
                break;
            }
        };
        if read == 0 {
            break;
        }

        match parse_command(line.trim_end_matches(['\n', '\r'])) {
            ChatCommand::Noop => {}
            ChatCommand::Send(text) => print_outcome(&session.send(&text)),
            ChatCommand::Help => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            ChatCommand::Undo => print_outcome(&session.undo()),
            ChatCommand::New => print_outcome(&session.reset()),
            ChatCommand::Analyze(prompt) => print_outcome(&session.analyze(prompt.as_deref())),
            ChatCommand::Select(ids) => match session.host_mut().select(&ids) {
                Ok(()) if ids.is_empty() => println!("Selection cleared."),
                Ok(()) => println!("Selected: {}", ids.join(", ")),
                Err(err) => println!("Select failed: {err:#}"),
            },
            ChatCommand::Photos => print_photos(session.host()),
            ChatCommand::Module(name) if name.is_empty() => {
                println!("Active module: {}", session.host().active_module());
            }
            ChatCommand::Module(name) => match session.host_mut().set_active_module(&name) {
                Ok(()) => println!("Active module set to {name}"),
                Err(err) => println!("Module change failed: {err:#}"),
            },
            ChatCommand::Key(value) if value.is_empty() => println!("/key requires a value"),
            ChatCommand::Key(value) => {
                println!("{}", remember(&mut prefs, PREF_API_KEY, &value, "API key"));
                session.set_api_key(Some(value));
            }
            ChatCommand::Model(name) if name.is_empty() => {
                println!("Model: {}", session.model());
            }
            ChatCommand::Model(name) => match session.set_model(&name) {
                Ok(model) => {
                    println!("Model set to {model}");
                    println!("{}", remember(&mut prefs, PREF_MODEL, &model, "Model"));
                }
                Err(reason) => println!("{reason}"),
            },
            ChatCommand::Quit => break,
            ChatCommand::Unknown { command, .. } => {
                println!("Unknown command: /{command}. Type /help for commands.");
            }
        }
    }

    let summary = session.finish(&summary_path)?;
    info!(
        turns = summary.turns,
        edits = summary.edits_applied,
        summary = %summary_path.display(),
        "chat closed"
    );
    Ok(())
}

/// Persists one preference and describes the outcome. A failed write only
/// loses persistence; the value still applies to the running session.
fn remember(prefs: &mut PrefsStore, key: &str, value: &str, what: &str) -> String {
    match prefs.set_string(key, value) {
        Ok(()) => format!("{what} saved to {}", prefs.path().display()),
        Err(err) => format!(
            "Could not save {} to {}: {err:#}",
            what.to_lowercase(),
            prefs.path().display()
        ),
    }
}

fn run_extract(args: ExtractArgs) -> Result<i32> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let report = extract_report(&raw, args.temperature, args.tint);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report["action"].is_null() { 2 } else { 0 })
}

fn run_set_key(args: SetKeyArgs) -> Result<i32> {
    let key = args.key.trim();
    if key.is_empty() {
        eprintln!("set-key requires a non-empty key");
        return Ok(2);
    }
    let mut prefs = open_prefs(args.prefs.as_deref())?;
    prefs.set_string(PREF_API_KEY, key)?;
    println!("API key saved to {}", prefs.path().display());
    Ok(0)
}

fn open_prefs(explicit: Option<&Path>) -> Result<PrefsStore> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => PrefsStore::default_path()
            .context("no config directory on this platform; pass --prefs")?,
    };
    Ok(PrefsStore::new(path))
}

/// `--dryrun` overrides any requested model; otherwise the model's backend
/// decides whether the session goes online.
fn resolve_model(requested: Option<&str>, dryrun: bool) -> Result<ModelSpec> {
    let requested = if dryrun { Some(DRYRUN_MODEL) } else { requested };
    let selection = ModelSelector::default()
        .select(requested, Capability::Text)
        .map_err(anyhow::Error::msg)?;
    if let Some(reason) = selection.fallback_reason.as_deref() {
        if selection.requested.is_some() {
            warn!(model = %selection.model.name, "{reason}");
        }
    }
    Ok(selection.model)
}

/// Extraction and translation of one reply, as printed by `extract`.
fn extract_report(raw: &str, temperature: f64, tint: f64) -> Value {
    let context = ContextSnapshot::new("Develop", 1, Some(temperature), Some(tint));
    match extract_action(raw) {
        Some(action) => {
            let edit = translate(&action.params, &context);
            json!({
                "action": action.action,
                "kind": action.kind.label(),
                "params": action.params,
                "white_balance": context.white_balance,
                "translated": edit,
                "display": display_text(raw),
            })
        }
        None => json!({
            "action": Value::Null,
            "display": display_text(raw),
        }),
    }
}

fn sibling_path(path: &Path, file_name: &str) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(display) = outcome.display.as_deref() {
        println!("{display}");
    }
    for line in &outcome.status {
        println!("[{line}]");
    }
}

fn print_photos<H: DevelopHost>(host: &H) {
    let selected = host.selected_photos();
    let lines = photo_lines(host, &selected);
    if lines.is_empty() {
        println!("No photos selected. Use --photo <path> to add some, then /select <ids>.");
        return;
    }
    for line in lines {
        println!("{line}");
    }
}

fn photo_lines<H: DevelopHost>(host: &H, ids: &[String]) -> Vec<String> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            let marker = if index == 0 { "*" } else { " " };
            let media = host
                .media_kind(id)
                .map(|media| media.label())
                .unwrap_or("unknown");
            let temperature = host
                .develop_settings(id)
                .ok()
                .and_then(|settings| settings.get("Temperature").and_then(Value::as_f64))
                .map(|value| format!("{value:.0}"))
                .unwrap_or_else(|| "-".to_string());
            format!("{marker} {id} ({media}, temperature {temperature})")
        })
        .collect()
}
