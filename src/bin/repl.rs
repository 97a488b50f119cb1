use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use clap::{Arg, Command};
use log::{LevelFilter, debug};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, EditMode, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use lispy::{
    Environment, TokenKind, eval_str, new_root_environment, render, special_form_identifiers,
    tokenize,
};

struct LispyCompleter {
    env: Rc<RefCell<Environment>>,
}

impl LispyCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        LispyCompleter { env }
    }
}

impl rustyline::completion::Completer for LispyCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        // Only complete when the cursor sits at the end of an atom.
        let prefix = match tokenize(&line[..pos]).pop() {
            Some(token) if token.span.end == pos => match token.kind {
                TokenKind::Atom(prefix) => prefix,
                _ => return Ok((pos, vec![])),
            },
            _ => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .get_identifiers()
            .union(&special_form_identifiers())
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: LispyCompleter,
}

struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth = 0usize;
        for (i, c) in ctx.input().chars().enumerate() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            // Keep reading lines until the list is closed
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        // (index in line, index in highlighted) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::new();
        let touches = |at: usize| pos == at || pos == at + 1;

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open, matching_pos)) if touches(i) || touches(open) => {
                        highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue for matching parens
                        highlighted.replace_range(matching_pos..=matching_pos, "\x1b[1;34m(\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched parens
                },
                _ => highlighted.push(c),
            }
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    // Setup logging.
    env_logger::Builder::from_default_env()
        .filter_module("rustyline", LevelFilter::Warn)
        .init();

    let matches = Command::new("repl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interactive S-expression interpreter")
        .arg(
            Arg::new("history")
                .long("history")
                .takes_value(true)
                .value_name("FILE")
                .default_value("lispy_history.txt")
                .help("Where to load and save line history"),
        )
        .arg(
            Arg::new("prompt")
                .long("prompt")
                .takes_value(true)
                .default_value("lispy> ")
                .help("Prompt shown before each line"),
        )
        .arg(
            Arg::new("vi")
                .long("vi")
                .help("Use vi key bindings instead of emacs"),
        )
        .get_matches();
    let history = matches.value_of("history").unwrap_or("lispy_history.txt");
    let prompt = matches.value_of("prompt").unwrap_or("lispy> ");
    let edit_mode = if matches.is_present("vi") {
        EditMode::Vi
    } else {
        EditMode::Emacs
    };

    println!("Lisp interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Rc::new(RefCell::new(new_root_environment()));
    let h = InputValidator {
        highlighter: ParenHighlighter,
        validator: ParenValidator,
        completer: LispyCompleter::new(global_env.clone()),
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(history).is_err() {
        debug!("no previous history at {}", history);
    }

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match eval_str(trimmed_input, &mut global_env.borrow_mut()) {
                    Ok(value) if value.is_void() => {}
                    Ok(value) => println!("{}", render(&value)),
                    Err(e) => e.pretty_print("REPL", trimmed_input)?,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                // Ctrl-C or Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(history)
}
