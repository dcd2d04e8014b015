//! MODE argument parsing and rendering.

use std::fmt;

/// Direction of a single mode change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Remove,
}

impl Action {
    #[inline]
    pub fn sign(self) -> char {
        match self {
            Action::Add => '+',
            Action::Remove => '-',
        }
    }

    #[inline]
    pub fn is_add(self) -> bool {
        matches!(self, Action::Add)
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Action::Add => Action::Remove,
            Action::Remove => Action::Add,
        }
    }
}

/// One requested or applied mode change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeChange {
    pub letter: char,
    pub action: Action,
    pub param: Option<String>,
}

impl ModeChange {
    pub fn add(letter: char, param: Option<&str>) -> Self {
        Self {
            letter,
            action: Action::Add,
            param: param.map(str::to_string),
        }
    }

    pub fn remove(letter: char, param: Option<&str>) -> Self {
        Self {
            letter,
            action: Action::Remove,
            param: param.map(str::to_string),
        }
    }
}

/// Split MODE arguments into individual changes.
///
/// `args[0]` holds the letters, the rest are parameters consumed in order
/// for letters where `takes_param(letter, action)` is true. A letter that
/// wants a parameter when none are left gets `param: None`.
pub fn parse_mode_changes<F>(args: &[String], takes_param: F) -> Vec<ModeChange>
where
    F: Fn(char, Action) -> bool,
{
    let mut changes = Vec::new();
    let Some((letters, params)) = args.split_first() else {
        return changes;
    };
    let mut params = params.iter();
    let mut action = Action::Add;

    for c in letters.chars() {
        match c {
            '+' => action = Action::Add,
            '-' => action = Action::Remove,
            letter => {
                let param = if takes_param(letter, action) {
                    params.next().cloned()
                } else {
                    None
                };
                changes.push(ModeChange {
                    letter,
                    action,
                    param,
                });
            }
        }
    }
    changes
}

/// Rendered form of a change list: `+ab-c` plus the parameters in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeString {
    pub letters: String,
    pub params: Vec<String>,
}

impl ModeString {
    /// Render in the given order, emitting a sign only when polarity changes.
    pub fn render<'a, I>(changes: I) -> Self
    where
        I: IntoIterator<Item = &'a ModeChange>,
    {
        let mut out = ModeString::default();
        let mut current = None;
        for change in changes {
            if current != Some(change.action) {
                out.letters.push(change.action.sign());
                current = Some(change.action);
            }
            out.letters.push(change.letter);
            if let Some(param) = &change.param {
                out.params.push(param.clone());
            }
        }
        out
    }

    /// Letters followed by parameters, ready to append to a MODE message.
    pub fn into_params(self) -> Vec<String> {
        let mut params = Vec::with_capacity(self.params.len() + 1);
        params.push(self.letters);
        params.extend(self.params);
        params
    }
}

impl fmt::Display for ModeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}
