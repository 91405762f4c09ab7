use novacalc::explain::{ExplainError, Explainer, Explanation, explain_or_fallback};
use novacalc::history::{FileStorage, HISTORY_KEY, HistoryStore, MAX_ENTRIES, Storage};
use novacalc::keymap::{Key, Keymap, Mode};
use novacalc::session::{Calculator, Outcome};
use novacalc::{ERROR_MARKER, MemoryStorage};
use tempfile::TempDir;

fn type_line<S: Storage>(calc: &mut Calculator<S>, keymap: &Keymap, line: &str) -> Vec<Outcome> {
    keymap
        .translate(line)
        .into_iter()
        .filter_map(|action| calc.apply(action))
        .collect()
}

#[test]
fn keyboard_session_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let keymap = Keymap::default();

    let mut calc = Calculator::new(HistoryStore::load(FileStorage::new(tmp.path())));
    let outcomes = type_line(&mut calc, &keymap, "12*3=");
    assert!(matches!(outcomes.as_slice(), [Outcome::Success(_)]));
    assert_eq!(calc.expression(), "12×3");
    assert_eq!(calc.result(), "36");

    calc.apply(keymap.resolve(Key::Escape).unwrap());
    type_line(&mut calc, &keymap, "1/3=");
    assert_eq!(calc.result(), "0.33333333");

    // Restart: a fresh store over the same directory sees both entries.
    let mut restarted = Calculator::new(HistoryStore::load(FileStorage::new(tmp.path())));
    let entries = restarted.history().entries().to_vec();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].expression(), "1÷3");
    assert_eq!(entries[1].expression(), "12×3");

    assert!(restarted.replay(entries[1].id()));
    assert_eq!(restarted.expression(), "12×3");
    assert_eq!(restarted.result(), "36");
}

#[test]
fn clearing_history_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let storage = FileStorage::new(tmp.path());
    let mut calc = Calculator::new(HistoryStore::load(storage.clone()));
    calc.input("2^8");
    calc.evaluate();
    assert!(storage.path_for(HISTORY_KEY).exists());

    calc.clear_history();
    assert!(!storage.path_for(HISTORY_KEY).exists());
    assert!(HistoryStore::load(storage).is_empty());
}

#[test]
fn corrupt_history_file_starts_empty() {
    let tmp = TempDir::new().unwrap();
    let storage = FileStorage::new(tmp.path());
    storage.write(HISTORY_KEY, "[{\"id\": 1").unwrap();

    let mut calc = Calculator::new(HistoryStore::load(storage.clone()));
    assert!(calc.history().is_empty());

    // The next successful evaluation overwrites the damaged file.
    calc.input("1+1");
    calc.evaluate();
    assert_eq!(HistoryStore::load(storage).len(), 1);
}

#[test]
fn malformed_inputs_never_touch_history() {
    let keymap = Keymap::default();
    let mut calc = Calculator::new(HistoryStore::load(MemoryStorage::new()));
    for line in ["5+*=", "1/0=", "sqrt(-4)=", "2(3)=", "((1)="] {
        calc.apply(keymap.resolve(Key::Escape).unwrap());
        let outcomes = type_line(&mut calc, &keymap, line);
        assert!(
            matches!(outcomes.as_slice(), [Outcome::Malformed(_)]),
            "{line}"
        );
        assert_eq!(calc.result(), ERROR_MARKER);
    }
    assert!(calc.history().is_empty());
}

#[test]
fn history_stays_bounded_over_long_session() {
    let mut calc = Calculator::new(HistoryStore::load(MemoryStorage::new()));
    for i in 0..(MAX_ENTRIES * 2) {
        calc.clear();
        calc.input(&format!("{i}+1"));
        calc.evaluate();
    }
    let entries = calc.history().entries();
    assert_eq!(entries.len(), MAX_ENTRIES);
    assert_eq!(entries[0].expression(), format!("{}+1", MAX_ENTRIES * 2 - 1));
}

#[test]
fn scientific_buttons_feed_the_evaluator() {
    let mut calc = Calculator::new(HistoryStore::load(MemoryStorage::new()));
    calc.set_mode(Mode::Scientific);
    for label in ["√", "8", "1", ")", "+", "log", "1", "0", "0", ")", "="] {
        let button = calc.mode().button(label).unwrap();
        calc.apply(button.action());
    }
    assert_eq!(calc.expression(), "√(81)+log(100)");
    assert_eq!(calc.result(), "11");
}

struct Unreachable;

impl Explainer for Unreachable {
    async fn explain(&self, _expression: &str, _result: &str) -> Result<Explanation, ExplainError> {
        Err(ExplainError::MalformedResponse("connection refused".to_string()))
    }
}

#[tokio::test]
async fn explanation_falls_back_and_respects_staleness() {
    let mut calc = Calculator::new(HistoryStore::load(MemoryStorage::new()));
    calc.input("7×6");
    calc.evaluate();

    let first = calc.begin_explanation().unwrap();
    calc.input("+1");
    calc.evaluate();
    let second = calc.begin_explanation().unwrap();

    let late = explain_or_fallback(&Unreachable, first.expression(), first.result()).await;
    let fresh = explain_or_fallback(&Unreachable, second.expression(), second.result()).await;

    // Completion order is reversed on purpose.
    assert!(calc.finish_explanation(&second, fresh));
    assert!(!calc.finish_explanation(&first, late));

    let shown = calc.explanation().unwrap();
    assert_eq!(shown.step_by_step, vec!["Result calculated: 43".to_string()]);
}
