use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use vocab_core::config::SessionConfig;
use vocab_core::core::locator::Located;
use vocab_core::core::types::SourceId;
use vocab_core::learning::SplitRequest;
use vocab_core::{Command, VocabError, VocabSession};

const CONFIG_PATH: &str = "vocab_sieve.json";

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("VOCAB_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
    if let Err(e) = run(&config_path) {
        error!(error = %e, "engine stopped");
        std::process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), VocabError> {
    let config = SessionConfig::load(config_path)?;
    let base = config_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut session = VocabSession::from_config(&config, base)?;
    info!("--- vocabulary engine ready ---");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut pending_split: Option<SplitRequest> = None;

    for line in stdin.lock().lines() {
        let input = line?;
        debug!(input = %input, "<-");
        let (command, rest) = input.split_once(' ').unwrap_or((input.as_str(), ""));
        let rest = rest.trim();
        let awaiting = pending_split.take();

        let reply = match command {
            "EXIT" => {
                session.save_state()?;
                writeln!(stdout, "BYE")?;
                break;
            }
            "CONFIRM_SPLIT" => match awaiting {
                Some(request) => dispatch(&mut session, Command::Split(request), &mut pending_split),
                None => "ERROR no split awaiting confirmation".to_string(),
            },
            "LOCATE" => match session.locate(rest) {
                Located::Found(hit) => format!("FOUND {} {} {}", hit.offset, hit.char_offset, hit.repeated),
                Located::NotFound => "NOT_FOUND".to_string(),
            },
            "GROUPS" => match rest.parse::<SourceId>() {
                Ok(source) => json_reply("GROUPS", &session.lesson_groups(source)),
                Err(e) => format!("ERROR {}", e),
            },
            "STATS" => json_reply("STATS", &session.stats()),
            "EXPORT" if rest == "text" => format!("EXPORT {}", session.export_text().replace('\n', " ")),
            "EXPORT" => match session.export_json() {
                Ok(json) => format!("EXPORT {}", json.replace('\n', "")),
                Err(e) => format!("ERROR {}", e),
            },
            other => match parse_command(other, rest) {
                Ok(command) => dispatch(&mut session, command, &mut pending_split),
                Err(e) => format!("ERROR {}", e),
            },
        };
        debug!(reply = %reply, "->");
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    info!("shutting down");
    Ok(())
}

fn parse_command(command: &str, rest: &str) -> Result<Command, VocabError> {
    let index = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| VocabError::invalid(format!("'{}' is not an item index", s)))
    };
    Ok(match command {
        "ANALYZE" => Command::Analyze(rest.to_string()),
        "SOURCE" => Command::SetSource(rest.parse()?),
        "TOGGLE" => Command::ToggleLesson(rest.parse()?),
        "GROUP" => {
            let mut parts = rest.split_whitespace();
            let source = parts.next().unwrap_or("").parse()?;
            Command::ToggleGroup { source, keys: parts.map(str::to_string).collect() }
        }
        "CUSTOM" => Command::AddCustomVocabulary(rest.to_string()),
        "CLEAR_CUSTOM" => Command::ClearCustomVocabulary,
        "MERGE" => Command::Merge(index(rest)?),
        "SPLIT" => {
            let (i, edited) = rest.split_once(' ').unwrap_or((rest, ""));
            Command::Split(SplitRequest::from_edit(index(i)?, edited))
        }
        other => return Err(VocabError::invalid(format!("unknown command '{}'", other))),
    })
}

fn dispatch(session: &mut VocabSession, command: Command, pending_split: &mut Option<SplitRequest>) -> String {
    let split = match &command {
        Command::Split(request) => Some(request.clone()),
        _ => None,
    };
    match session.apply(command) {
        Ok(view) => json_reply("RESULT", &view.result),
        Err(VocabError::AmbiguousCorrection { original, rebuilt }) => {
            *pending_split = split.map(|request| request.confirm(original.clone()));
            format!("AMBIGUOUS {} {}", original, rebuilt)
        }
        Err(e) => format!("ERROR {}", e),
    }
}

fn json_reply<T: serde::Serialize>(tag: &str, value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => format!("{} {}", tag, json),
        Err(e) => format!("ERROR {}", e),
    }
}
