//! Interactive prompts.
//!
//! Every prompt returns `Ok(None)` when the user aborts, so callers can map the
//! abort to [`HubError::Cancelled`](crate::error::HubError::Cancelled) at the
//! step that owns it.

use console::{Term, style};

use crate::cli::progress::ProgressHandle;
use crate::error::Result;

pub trait Prompter {
    /// Choose any subset of `items`. `defaults[i]` preselects item `i`.
    fn multi_select(
        &mut self,
        prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>>;

    /// Free-form single line of text.
    fn text(&mut self, prompt: &str) -> Result<Option<String>>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<Option<bool>>;
}

/// Line-oriented prompts on the controlling terminal (stderr + stdin).
pub struct TermPrompter {
    term: Term,
}

impl TermPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn read_answer(&self) -> Result<Option<String>> {
        match self.term.read_line() {
            Ok(line) => Ok(Some(line)),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one line typed at the multi-select prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectAnswer {
    Accept,
    Cancel,
    Toggle(Vec<usize>),
    Invalid,
}

/// Parse `1,3 4` style input into zero-based indices below `len`.
pub(crate) fn parse_select_answer(line: &str, len: usize) -> SelectAnswer {
    let line = line.trim();
    if line.is_empty() {
        return SelectAnswer::Accept;
    }
    if line.eq_ignore_ascii_case("q") {
        return SelectAnswer::Cancel;
    }
    let mut indices = Vec::new();
    for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        match token.parse::<usize>() {
            Ok(n) if n >= 1 && n <= len => indices.push(n - 1),
            _ => return SelectAnswer::Invalid,
        }
    }
    SelectAnswer::Toggle(indices)
}

impl Prompter for TermPrompter {
    fn multi_select(
        &mut self,
        prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        let mut chosen: Vec<bool> = (0..items.len())
            .map(|i| defaults.get(i).copied().unwrap_or(false))
            .collect();
        loop {
            self.term.write_line(&style(prompt).bold().to_string())?;
            for (i, item) in items.iter().enumerate() {
                let mark = if chosen[i] { "[x]" } else { "[ ]" };
                self.term.write_line(&format!("  {mark} {}. {item}", i + 1))?;
            }
            self.term
                .write_str("Toggle by number (e.g. 1,3), Enter to confirm, q to cancel: ")?;
            let Some(line) = self.read_answer()? else {
                return Ok(None);
            };
            match parse_select_answer(&line, items.len()) {
                SelectAnswer::Accept => {
                    return Ok(Some(
                        chosen
                            .iter()
                            .enumerate()
                            .filter_map(|(i, on)| on.then_some(i))
                            .collect(),
                    ));
                }
                SelectAnswer::Cancel => return Ok(None),
                SelectAnswer::Toggle(indices) => {
                    for i in indices {
                        chosen[i] = !chosen[i];
                    }
                }
                SelectAnswer::Invalid => {
                    self.term.write_line(&style("Invalid selection").yellow().to_string())?;
                }
            }
        }
    }

    fn text(&mut self, prompt: &str) -> Result<Option<String>> {
        self.term.write_str(&format!("{}: ", style(prompt).bold()))?;
        self.read_answer()
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<Option<bool>> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        self.term.write_str(&format!("{} {hint} ", style(prompt).bold()))?;
        let Some(line) = self.read_answer()? else {
            return Ok(None);
        };
        let answer = line.trim().to_ascii_lowercase();
        Ok(Some(match answer.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        }))
    }
}

/// Hides a running spinner while the wrapped prompter has the terminal.
pub struct SpinnerPause<'a> {
    inner: &'a mut dyn Prompter,
    spinner: &'a ProgressHandle,
}

impl<'a> SpinnerPause<'a> {
    pub fn new(inner: &'a mut dyn Prompter, spinner: &'a ProgressHandle) -> Self {
        Self { inner, spinner }
    }
}

impl Prompter for SpinnerPause<'_> {
    fn multi_select(
        &mut self,
        prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        let inner = &mut *self.inner;
        self.spinner
            .suspend(|| inner.multi_select(prompt, items, defaults))
    }

    fn text(&mut self, prompt: &str) -> Result<Option<String>> {
        let inner = &mut *self.inner;
        self.spinner.suspend(|| inner.text(prompt))
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<Option<bool>> {
        let inner = &mut *self.inner;
        self.spinner.suspend(|| inner.confirm(prompt, default))
    }
}

/// Prompter that replays canned answers; an exhausted queue aborts.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    pub selections: std::collections::VecDeque<Option<Vec<usize>>>,
    pub texts: std::collections::VecDeque<String>,
    pub confirms: std::collections::VecDeque<bool>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn with_texts<const N: usize>(texts: [&str; N]) -> Self {
        Self {
            texts: texts.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn multi_select(
        &mut self,
        prompt: &str,
        _items: &[String],
        _defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        self.asked.push(prompt.to_string());
        Ok(self.selections.pop_front().flatten())
    }

    fn text(&mut self, prompt: &str) -> Result<Option<String>> {
        self.asked.push(prompt.to_string());
        Ok(self.texts.pop_front())
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<Option<bool>> {
        self.asked.push(prompt.to_string());
        Ok(self.confirms.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_answer_parsing() {
        assert_eq!(parse_select_answer("", 3), SelectAnswer::Accept);
        assert_eq!(parse_select_answer(" Q ", 3), SelectAnswer::Cancel);
        assert_eq!(parse_select_answer("1, 3", 3), SelectAnswer::Toggle(vec![0, 2]));
        assert_eq!(parse_select_answer("2 2", 3), SelectAnswer::Toggle(vec![1, 1]));
        assert_eq!(parse_select_answer("4", 3), SelectAnswer::Invalid);
        assert_eq!(parse_select_answer("0", 3), SelectAnswer::Invalid);
        assert_eq!(parse_select_answer("x", 3), SelectAnswer::Invalid);
    }

    #[test]
    fn spinner_pause_delegates() {
        let mut inner = ScriptedPrompter::with_texts(["notes"]);
        let spinner = ProgressHandle::Noop;
        let mut paused = SpinnerPause::new(&mut inner, &spinner);
        assert_eq!(paused.text("Changelog").unwrap().as_deref(), Some("notes"));
        assert_eq!(paused.confirm("ok?", false).unwrap(), None);
        assert_eq!(inner.asked, vec!["Changelog", "ok?"]);
    }

    #[test]
    fn scripted_prompter_aborts_when_exhausted() {
        let mut prompter = ScriptedPrompter::default();
        assert_eq!(prompter.text("anything").unwrap(), None);
        assert_eq!(prompter.confirm("ok?", true).unwrap(), None);
        assert_eq!(prompter.multi_select("pick", &[], &[]).unwrap(), None);
        assert_eq!(prompter.asked.len(), 3);
    }
}
