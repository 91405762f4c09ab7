//! Input surface tables: keyboard bindings and keypad layouts.
//!
//! Nothing here decides anything; it only says which key or button maps
//! to which calculator action.

use std::collections::HashMap;
use std::fmt;

/// A user action forwarded to the calculator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Append(String),
    DeleteLast,
    Clear,
    Evaluate,
}

/// A physical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
}

/// What a bound key does. Kept `'static` so the table can be a const.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Binding {
    Insert(&'static str),
    DeleteLast,
    Clear,
    Evaluate,
}

impl Binding {
    fn to_action(self) -> Action {
        match self {
            Self::Insert(token) => Action::Append(token.to_string()),
            Self::DeleteLast => Action::DeleteLast,
            Self::Clear => Action::Clear,
            Self::Evaluate => Action::Evaluate,
        }
    }
}

const DEFAULT_BINDINGS: &[(Key, Binding)] = &[
    (Key::Char('0'), Binding::Insert("0")),
    (Key::Char('1'), Binding::Insert("1")),
    (Key::Char('2'), Binding::Insert("2")),
    (Key::Char('3'), Binding::Insert("3")),
    (Key::Char('4'), Binding::Insert("4")),
    (Key::Char('5'), Binding::Insert("5")),
    (Key::Char('6'), Binding::Insert("6")),
    (Key::Char('7'), Binding::Insert("7")),
    (Key::Char('8'), Binding::Insert("8")),
    (Key::Char('9'), Binding::Insert("9")),
    (Key::Char('.'), Binding::Insert(".")),
    (Key::Char('+'), Binding::Insert("+")),
    (Key::Char('-'), Binding::Insert("-")),
    (Key::Char('*'), Binding::Insert("×")),
    (Key::Char('/'), Binding::Insert("÷")),
    (Key::Char('('), Binding::Insert("(")),
    (Key::Char(')'), Binding::Insert(")")),
    (Key::Char('^'), Binding::Insert("^")),
    (Key::Char('='), Binding::Evaluate),
    (Key::Enter, Binding::Evaluate),
    (Key::Backspace, Binding::DeleteLast),
    (Key::Escape, Binding::Clear),
];

/// Keyboard bindings.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<Key, Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: DEFAULT_BINDINGS.iter().copied().collect(),
        }
    }
}

impl Keymap {
    /// The action bound to `key`, if any.
    pub fn action_for(&self, key: Key) -> Option<Action> {
        self.bindings.get(&key).map(|binding| binding.to_action())
    }

    /// Resolve a key press. Unbound printable characters are typed as-is.
    pub fn resolve(&self, key: Key) -> Option<Action> {
        match (self.action_for(key), key) {
            (Some(action), _) => Some(action),
            (None, Key::Char(c)) if !c.is_control() => Some(Action::Append(c.to_string())),
            (None, _) => None,
        }
    }

    /// Turn a typed line into the actions its characters produce.
    ///
    /// Whitespace is dropped; the line break itself is not a key press.
    pub fn translate(&self, line: &str) -> Vec<Action> {
        line.chars()
            .filter(|c| !c.is_whitespace())
            .filter_map(|c| self.resolve(Key::Char(c)))
            .collect()
    }
}

/// Which keypad is shown. Affects only the buttons offered, never evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Basic,
    Scientific,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Basic => Self::Scientific,
            Self::Scientific => Self::Basic,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "scientific" | "sci" => Some(Self::Scientific),
            _ => None,
        }
    }

    /// Buttons in keypad order, row by row, four per row.
    pub fn buttons(self) -> Vec<Button> {
        let mut buttons = Vec::with_capacity(SCIENTIFIC_PAD.len() + BASIC_PAD.len());
        if self == Self::Scientific {
            buttons.extend_from_slice(SCIENTIFIC_PAD);
        }
        buttons.extend_from_slice(BASIC_PAD);
        buttons
    }

    /// Find a button on this mode's keypad by its label.
    pub fn button(self, label: &str) -> Option<Button> {
        self.buttons().into_iter().find(|b| b.label == label)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Scientific => f.write_str("scientific"),
        }
    }
}

/// A keypad button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    binding: Binding,
}

impl Button {
    const fn insert(label: &'static str, token: &'static str) -> Self {
        Self {
            label,
            binding: Binding::Insert(token),
        }
    }

    const fn command(label: &'static str, binding: Binding) -> Self {
        Self { label, binding }
    }

    pub fn action(&self) -> Action {
        self.binding.to_action()
    }
}

const SCIENTIFIC_PAD: &[Button] = &[
    Button::insert("sin", "sin("),
    Button::insert("cos", "cos("),
    Button::insert("tan", "tan("),
    Button::insert("√", "√("),
    Button::insert("log", "log("),
    Button::insert("ln", "ln("),
    Button::insert("π", "π"),
    Button::insert("^", "^"),
];

const BASIC_PAD: &[Button] = &[
    Button::command("C", Binding::Clear),
    Button::insert("(", "("),
    Button::insert(")", ")"),
    Button::insert("÷", "÷"),
    Button::insert("7", "7"),
    Button::insert("8", "8"),
    Button::insert("9", "9"),
    Button::insert("×", "×"),
    Button::insert("4", "4"),
    Button::insert("5", "5"),
    Button::insert("6", "6"),
    Button::insert("-", "-"),
    Button::insert("1", "1"),
    Button::insert("2", "2"),
    Button::insert("3", "3"),
    Button::insert("+", "+"),
    Button::insert("0", "0"),
    Button::insert(".", "."),
    Button::command("⌫", Binding::DeleteLast),
    Button::command("=", Binding::Evaluate),
];
