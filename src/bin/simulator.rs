use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use std::io::{stdin, stdout, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use vocab_core::config::SessionConfig;
use vocab_core::core::locator::Located;
use vocab_core::core::types::{AnalysisItem, GroupState};
use vocab_core::learning::SplitRequest;
use vocab_core::{VocabError, VocabResult, VocabSession};

const CONFIG_PATH: &str = "vocab_sieve.json";

fn main() -> VocabResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("VOCAB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = SessionConfig::load(Path::new(CONFIG_PATH))?;
    let mut session = VocabSession::from_config(&config, Path::new("."))?;
    let mut status = String::from("Paste a text and press [Enter] to analyse.");

    loop {
        print_ui(&session, &status)?;
        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();

        status = match cmd {
            "exit" => break,
            "" => continue,
            s if s.starts_with(':') => run_command(&mut session, &s[1..]),
            text => {
                session.analyze(text);
                format!("Analysed {} characters.", session.stats().total_chars)
            }
        };
    }

    println!("\nSaving session...");
    if let Err(e) = session.save_state() {
        eprintln!("[ERROR] Could not save session: {}", e);
    }
    Ok(())
}

fn run_command(session: &mut VocabSession, line: &str) -> String {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match execute_command(session, cmd, rest) {
        Ok(message) => message,
        Err(VocabError::AmbiguousCorrection { original, rebuilt }) => {
            format!("'{}' does not spell '{}'; repeat with :x! to apply anyway", rebuilt, original)
        }
        Err(e) => format!("Error: {}", e),
    }
}

fn index(s: &str) -> VocabResult<usize> {
    s.trim().parse::<usize>().map_err(|_| VocabError::invalid(format!("bad index '{}'", s)))
}

fn execute_command(session: &mut VocabSession, cmd: &str, rest: &str) -> VocabResult<String> {
    match cmd {
        "s" => {
            session.set_source(rest.parse()?)?;
            Ok(format!("Active source: {}", session.active_source()))
        }
        "t" => {
            session.toggle_lesson(&rest.parse()?)?;
            Ok(format!("Toggled {}", rest))
        }
        "c" => Ok(format!("Added {:?}", session.add_custom_vocabulary(rest))),
        "cc" => {
            session.clear_custom_vocabulary();
            Ok("Custom vocabulary cleared.".to_string())
        }
        "m" => Ok(format!("{:?}", session.merge(index(rest)?)?)),
        "x" | "x!" => {
            let (i, edited) = rest.split_once(' ').unwrap_or((rest, ""));
            let i = index(i)?;
            let mut request = SplitRequest::from_edit(i, edited);
            if cmd == "x!" {
                let original = session.result().get(i).map(|item| item.word.clone()).unwrap_or_default();
                request = request.confirm(original);
            }
            Ok(format!("{:?}", session.split(&request)?))
        }
        "f" => {
            let word = session
                .result()
                .get(index(rest)?)
                .map(|item| item.word.clone())
                .ok_or_else(|| VocabError::invalid("no such item"))?;
            Ok(match session.locate(&word) {
                Located::Found(hit) if hit.repeated => format!("'{}' occurs only at char {}", word, hit.char_offset),
                Located::Found(hit) => format!("'{}' at char {}", word, hit.char_offset),
                Located::NotFound => format!("'{}' is not in the text", word),
            })
        }
        other => Err(VocabError::invalid(format!("unknown command ':{}'", other))),
    }
}

fn level_line(index: usize, item: &AnalysisItem, source_tag: &str) -> String {
    let level = match &item.level {
        Some(level) => format!("TBCL {}", level),
        None => "TBCL無".to_string(),
    };
    let lesson = match &item.source_lesson {
        Some(lesson) => format!("{} {}", source_tag, lesson),
        None => format!("《{}》無", source_tag),
    };
    let word = format!("{:>3}. {}", index, item.word);
    let word = match item.level.as_deref() {
        Some("1") | Some("2") => word.green(),
        Some("3") | Some("4") => word.yellow(),
        Some(_) => word.red(),
        None => word.dark_grey(),
    };
    format!("{}  [{}] [{}]", word, level, lesson)
}

fn print_ui(session: &VocabSession, status: &str) -> std::io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    println!("{}", "Vocabulary Sieve Simulator".bold());
    println!("---------------------------------------------------------------");
    println!("Commands: :s <src>  :t <src:key>  :c <words>  :cc  :m <i>  :x <i> <parts>  :f <i>  exit\n");

    let source = session.active_source();
    let groups: Vec<String> = session
        .lesson_groups(source)
        .iter()
        .map(|g| {
            let mark = match g.state {
                GroupState::All => "[x]",
                GroupState::Some => "[-]",
                GroupState::None => "[ ]",
            };
            format!("{} {}", mark, g.label)
        })
        .collect();
    println!(
        "Source: {}  selected: {}  custom: {}",
        source,
        session.selection().selected_count(source),
        session.selection().custom_count()
    );
    println!("Groups: {}\n", groups.join("  "));

    let result = session.result();
    if result.is_empty() {
        println!("No new words.");
    } else {
        for (i, item) in result.iter().enumerate() {
            println!("{}", level_line(i, item, source.short_label()));
        }
    }
    let stats = session.stats();
    println!("\nCharacters: {}  New words: {}", stats.total_chars, stats.new_words);
    println!("{}", status.italic());
    print!("\n> ");
    out.flush()
}
