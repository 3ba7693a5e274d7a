//! menu-scan CLI.
//!
//! Usage:
//!   menu-scan analyze <image> [--lang <code>] [--json]          Translate a menu photo
//!   menu-scan order <menu-lang> <dish>... [--note <text>] [--lang <code>]
//!                                                               Two-part order script
//!   menu-scan ask <dish> <question> [--lang <code>]             Ask about one dish
//!
//! Backend and defaults come from MENU_SCAN_* variables (see `config`).
//! Exit code 1 when the flow fails, 2 on bad usage.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use menu_scan_lib::ask::DishConversation;
use menu_scan_lib::cart::{OrderLine, OrderRequest};
use menu_scan_lib::stream::{ItemView, MenuEvent, RecordKind};
use menu_scan_lib::{language, Config, FlowState, MenuClient, MenuImage};

const USAGE: &str = "\
Usage:
  menu-scan analyze <image> [--lang <code>] [--json]
  menu-scan order <menu-lang> <dish>... [--note <text>] [--lang <code>]
  menu-scan ask <dish> <question> [--lang <code>]";

/// Positional arguments plus the few flags the commands take.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<String>,
    lang: Option<String>,
    note: Option<String>,
    json: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" => {
                let value = iter.next().ok_or("--lang requires a language code")?;
                args.lang = Some(value.clone());
            }
            "--note" => {
                let value = iter.next().ok_or("--note requires a text")?;
                args.note = Some(value.clone());
            }
            "--json" => args.json = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ => args.positional.push(arg.clone()),
        }
    }
    Ok(args)
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("{}", message);
    eprintln!("{}", USAGE);
    ExitCode::from(2)
}

fn exit_for(state: &FlowState) -> ExitCode {
    match state {
        FlowState::Completed => ExitCode::SUCCESS,
        FlowState::Failed(message) => {
            eprintln!("Error: {}", message);
            ExitCode::from(1)
        }
        other => {
            eprintln!("Error: flow ended in state {:?}", other);
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = raw.split_first() else {
        return usage_error("Missing command.");
    };
    let args = match parse_args(rest) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };
    let user_language = args
        .lang
        .as_deref()
        .map(|tag| language::resolve(tag).code)
        .unwrap_or(config.user_language);

    let client = match MenuClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    match command.as_str() {
        "analyze" => run_analyze(&client, &args, user_language).await,
        "order" => run_order(&client, &args, user_language).await,
        "ask" => run_ask(&client, &args, user_language).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            ExitCode::SUCCESS
        }
        other => usage_error(&format!("Unknown command: {}", other)),
    }
}

// ── analyze ──────────────────────────────────────────────────────────

async fn run_analyze(client: &MenuClient, args: &Args, user_language: &str) -> ExitCode {
    let [path] = args.positional.as_slice() else {
        return usage_error("analyze takes exactly one image path.");
    };
    let image = match MenuImage::open(Path::new(path)) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e.user_message(menu_scan_lib::error::ANALYSIS_FAILURE));
            return ExitCode::from(1);
        }
    };

    let json = args.json;
    let session = menu_scan_lib::analyze_menu(client, &image, user_language, |event| {
        if let MenuEvent::Record(record) = event {
            if json {
                match serde_json::to_string(record) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::warn!("[MENU] Could not serialize record: {}", e),
                }
            } else {
                print_record(record.kind, &record.payload);
            }
        }
    })
    .await;

    if let Some(lang) = session.menu_language() {
        let name = language::display_name(lang).unwrap_or(lang);
        eprintln!("Menu language: {}", name);
    }
    exit_for(session.state())
}

fn print_record(kind: RecordKind, payload: &str) {
    match kind {
        RecordKind::Lang => {}
        RecordKind::Intro => println!("{}", payload),
        RecordKind::Cat => println!("\n## {}", payload),
        RecordKind::Item => match ItemView::from_payload(payload) {
            ItemView::Structured(fields) => {
                let price = fields.price().unwrap_or("-");
                println!("  {} ({})  {}", fields.translated_name, fields.original_name, price);
                if let Some(note) = fields.note() {
                    println!("      {}", note);
                }
            }
            ItemView::Raw { text } => println!("  {}", text),
        },
        RecordKind::Error => {}
    }
    let _ = std::io::stdout().flush();
}

// ── order ────────────────────────────────────────────────────────────

async fn run_order(client: &MenuClient, args: &Args, user_language: &str) -> ExitCode {
    let Some((menu_language, dishes)) = args.positional.split_first() else {
        return usage_error("order needs a menu language and at least one dish.");
    };
    if dishes.is_empty() {
        return usage_error("order needs at least one dish.");
    }
    let lines = dishes
        .iter()
        .map(|dish| OrderLine {
            original_name: dish.clone(),
            name: dish.clone(),
            price: String::new(),
        })
        .collect();
    let request = OrderRequest::new(
        lines,
        Some(menu_language.as_str()),
        user_language,
        args.note.as_deref().unwrap_or(""),
    );

    let session = menu_scan_lib::generate_order(client, &request, |_| {}).await;
    let script = session.script();
    if !script.target.is_empty() {
        println!("{}", script.target);
    }
    if !script.translation.is_empty() {
        println!("\n---\n{}", script.translation);
    }
    exit_for(session.state())
}

// ── ask ──────────────────────────────────────────────────────────────

async fn run_ask(client: &MenuClient, args: &Args, user_language: &str) -> ExitCode {
    let [dish, question] = args.positional.as_slice() else {
        return usage_error("ask takes a dish name and a question.");
    };
    if question.trim().is_empty() {
        return usage_error("The question is empty.");
    }

    let mut conversation = DishConversation::new(dish.clone(), user_language);
    let mut printed = 0;
    menu_scan_lib::ask_dish(client, &mut conversation, question, |answer| {
        // Print only the newly arrived suffix.
        if let Some(new) = answer.get(printed..) {
            print!("{}", new);
            let _ = std::io::stdout().flush();
        }
        printed = answer.len();
    })
    .await;
    println!();
    exit_for(conversation.state())
}
