//! Interactive line-based session.
//!
//! Each line is typed through the keymap, so `*` becomes `×` just as on
//! the keypad. An empty line is the Enter key. Lines starting with `:` are
//! session commands. Explanations run in the background and are applied
//! only if they still describe what is on screen.

use super::{Backend, print_explanation, print_history};
use anyhow::{Context, Result};
use novacalc::explain::{Explanation, Ticket, explain_or_fallback};
use novacalc::history::Storage;
use novacalc::keymap::{Key, Keymap, Mode};
use novacalc::session::{Calculator, Outcome};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

const HELP: &str = "\
Type an expression; `=` or an empty line evaluates.
  :del             delete last character (Backspace)
  :esc             clear input and result (Escape)
  :b LABEL         press a keypad button, e.g. `:b sin`
  :keys            show the keypad for the current mode
  :mode [NAME]     switch between basic and scientific
  :history         list past calculations
  :replay ID|N     restore a past calculation
  :clear-history   delete all history
  :explain         explain the current result
  :quit            leave";

enum Flow {
    Continue,
    Explain(Ticket),
    Quit,
}

pub async fn run<S: Storage>(mut calc: Calculator<S>, backend: Arc<Backend>) -> Result<()> {
    let keymap = Keymap::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<(Ticket, Explanation)>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("NovaCalc ({} mode). Type :help for commands.", calc.mode());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match handle_line(&mut calc, &keymap, &line) {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Explain(ticket) => {
                        println!("(explaining {} = {} ...)", ticket.expression(), ticket.result());
                        let backend = Arc::clone(&backend);
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let explanation =
                                explain_or_fallback(&*backend, ticket.expression(), ticket.result())
                                    .await;
                            // The receiver only goes away when the session ends.
                            let _ = tx.send((ticket, explanation));
                        });
                    }
                }
            }
            Some((ticket, explanation)) = rx.recv() => {
                if calc.finish_explanation(&ticket, explanation) {
                    if let Some(explanation) = calc.explanation() {
                        print_explanation(explanation);
                    }
                } else {
                    debug!(serial = ticket.serial(), "Ignored explanation for an old result");
                }
            }
        }
    }

    Ok(())
}

fn handle_line<S: Storage>(calc: &mut Calculator<S>, keymap: &Keymap, line: &str) -> Flow {
    let line = line.trim();

    if line.is_empty() {
        return press(calc, keymap, Key::Enter);
    }

    let Some(command) = line.strip_prefix(':') else {
        for action in keymap.translate(line) {
            if let Some(outcome) = calc.apply(action) {
                report(calc, &outcome);
            }
        }
        show_input(calc);
        return Flow::Continue;
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, arg)| (name, arg.trim()));

    match name {
        "q" | "quit" | "exit" => return Flow::Quit,
        "help" | "h" => println!("{HELP}"),
        "del" => return press(calc, keymap, Key::Backspace),
        "esc" => return press(calc, keymap, Key::Escape),
        "b" => match calc.mode().button(arg) {
            Some(button) => {
                if let Some(outcome) = calc.apply(button.action()) {
                    report(calc, &outcome);
                }
                show_input(calc);
            }
            None => println!("No `{arg}` button in {} mode.", calc.mode()),
        },
        "keys" => print_keypad(calc.mode()),
        "mode" => {
            if arg.is_empty() {
                calc.toggle_mode();
            } else if let Some(mode) = Mode::parse(arg) {
                calc.set_mode(mode);
            } else {
                println!("Unknown mode `{arg}`; use basic or scientific.");
                return Flow::Continue;
            }
            println!("Mode: {}", calc.mode());
        }
        "history" => print_history(calc.history().entries()),
        "replay" => {
            let id = resolve_history_ref(calc, arg);
            if calc.replay(&id) {
                show_input(calc);
            } else {
                println!("No history entry `{arg}`.");
            }
        }
        "clear-history" => {
            calc.clear_history();
            println!("History cleared.");
        }
        "explain" => match calc.begin_explanation() {
            Some(ticket) => return Flow::Explain(ticket),
            None => println!("Nothing to explain; evaluate an expression first."),
        },
        other => println!("Unknown command `:{other}`. Type :help."),
    }

    Flow::Continue
}

fn press<S: Storage>(calc: &mut Calculator<S>, keymap: &Keymap, key: Key) -> Flow {
    if let Some(action) = keymap.resolve(key)
        && let Some(outcome) = calc.apply(action)
    {
        report(calc, &outcome);
        return Flow::Continue;
    }
    show_input(calc);
    Flow::Continue
}

/// A 1-based position in the listing also works in place of an id.
fn resolve_history_ref<S: Storage>(calc: &Calculator<S>, arg: &str) -> String {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| calc.history().entries().get(index))
        .map_or_else(|| arg.to_string(), |entry| entry.id().to_string())
}

fn report<S: Storage>(calc: &Calculator<S>, outcome: &Outcome) {
    match outcome {
        Outcome::Skipped => {}
        Outcome::Success(_) => println!("  {}\n= {}", calc.expression(), calc.result()),
        Outcome::Malformed(error) => {
            debug!(%error, "Evaluation failed");
            println!("  {}\n= {}", calc.expression(), calc.result());
        }
    }
}

fn show_input<S: Storage>(calc: &Calculator<S>) {
    let result = if calc.result().is_empty() {
        "0"
    } else {
        calc.result()
    };
    println!("  {}\n  [{}]", calc.expression(), result);
}

fn print_keypad(mode: Mode) {
    for row in mode.buttons().chunks(4) {
        let labels: Vec<String> = row.iter().map(|b| format!("{:^5}", b.label)).collect();
        println!("{}", labels.join(" "));
    }
}
