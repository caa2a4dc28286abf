use std::time::SystemTime;

use tracing::{debug, info};

/// Render status of a single character of the target text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Unvisited,
    Highlighted,
    Correct,
    Incorrect,
}

/// Lifecycle of a typing session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Status {
    Idle,
    Active,
    /// Cursor reached the end but incorrect characters remain.
    FinishedWithErrors,
    Complete,
}

/// User-facing hint describing what the session expects next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guidance {
    StartTyping,
    KeepTyping,
    FixErrors,
    UseBackspace,
    KeepCorrecting,
    Completed,
}

impl Guidance {
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::StartTyping => "Start typing to begin the test!",
            Guidance::KeepTyping => "Great! Keep typing...",
            Guidance::FixErrors => "You have errors! Use backspace to go back and correct them.",
            Guidance::UseBackspace => {
                "Please use backspace to go back and correct the highlighted errors!"
            }
            Guidance::KeepCorrecting => {
                "Keep using backspace to reach errors, then retype them correctly!"
            }
            Guidance::Completed => "Test completed!",
        }
    }
}

/// Emitted once when a session becomes complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinishEvent {
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub total_error_events: usize,
    pub length: usize,
}

/// What a single input event did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Ignored,
    Accepted,
    Finished(FinishEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    mark: Option<Mark>,
    // set on the first mismatch at this position, never cleared
    mistyped: bool,
}

/// Typing progress over one target text.
///
/// Each position keeps the mark left by the last character typed there.
/// Backspace moves the cursor back onto a position without erasing its
/// mark; the highlight simply takes precedence while the cursor sits on it,
/// and the mark is replaced when the next character arrives.
#[derive(Debug, Clone)]
pub struct Session {
    prompt: String,
    text: Vec<char>,
    cells: Vec<Cell>,
    cursor: usize,
    total_error_events: usize,
    started_at: Option<SystemTime>,
    status: Status,
    guidance: Guidance,
    finish_emitted: bool,
}

impl Session {
    pub fn new(text: impl Into<String>) -> Self {
        let prompt = text.into();
        let text: Vec<char> = prompt.chars().collect();
        let cells = vec![Cell::default(); text.len()];
        Self {
            prompt,
            text,
            cells,
            cursor: 0,
            total_error_events: 0,
            started_at: None,
            status: Status::Idle,
            guidance: Guidance::StartTyping,
            finish_emitted: false,
        }
    }

    /// Discards all progress and starts over on `text`.
    pub fn load_text(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
        debug!(length = self.len(), "session text loaded");
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn guidance(&self) -> Guidance {
        self.guidance
    }

    pub fn total_error_events(&self) -> usize {
        self.total_error_events
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.text.get(idx).copied()
    }

    pub fn char_status(&self, idx: usize) -> CharStatus {
        if idx == self.cursor && self.cursor < self.len() && self.status != Status::Complete {
            return CharStatus::Highlighted;
        }
        match self.cells.get(idx).and_then(|c| c.mark) {
            None => CharStatus::Unvisited,
            Some(Mark::Correct) => CharStatus::Correct,
            Some(Mark::Incorrect) => CharStatus::Incorrect,
        }
    }

    /// Characters paired with their current render status.
    pub fn render_model(&self) -> impl Iterator<Item = (char, CharStatus)> + '_ {
        self.text
            .iter()
            .enumerate()
            .map(|(idx, c)| (*c, self.char_status(idx)))
    }

    /// Incorrect characters currently on screen.
    pub fn outstanding_errors(&self) -> usize {
        (0..self.len())
            .filter(|&idx| self.char_status(idx) == CharStatus::Incorrect)
            .count()
    }

    pub fn submit_character(&mut self, typed: char) -> InputOutcome {
        self.submit_character_at(typed, SystemTime::now())
    }

    pub fn submit_character_at(&mut self, typed: char, now: SystemTime) -> InputOutcome {
        match self.status {
            Status::Complete => return InputOutcome::Ignored,
            Status::FinishedWithErrors => {
                self.guidance = Guidance::UseBackspace;
                return InputOutcome::Ignored;
            }
            Status::Idle | Status::Active => {}
        }
        if self.cursor >= self.len() {
            return InputOutcome::Ignored;
        }

        if self.status == Status::Idle {
            self.started_at = Some(now);
            self.status = Status::Active;
            info!(length = self.len(), "typing session started");
        }

        let expected = self.text[self.cursor];
        let cell = &mut self.cells[self.cursor];
        if typed == expected {
            cell.mark = Some(Mark::Correct);
        } else {
            if !cell.mistyped {
                cell.mistyped = true;
                self.total_error_events += 1;
            }
            cell.mark = Some(Mark::Incorrect);
        }

        self.cursor += 1;
        self.guidance = Guidance::KeepTyping;

        match self.evaluate_completion(now) {
            Some(event) => InputOutcome::Finished(event),
            None => InputOutcome::Accepted,
        }
    }

    pub fn submit_backspace(&mut self) -> InputOutcome {
        if self.cursor == 0 || !matches!(self.status, Status::Active | Status::FinishedWithErrors)
        {
            return InputOutcome::Ignored;
        }

        if self.cursor < self.len() {
            self.cells[self.cursor].mark = None;
        }
        self.cursor -= 1;
        self.status = Status::Active;
        self.guidance = if self.outstanding_errors() > 0 {
            Guidance::KeepCorrecting
        } else {
            Guidance::KeepTyping
        };
        InputOutcome::Accepted
    }

    fn evaluate_completion(&mut self, now: SystemTime) -> Option<FinishEvent> {
        if self.cursor < self.len() {
            return None;
        }
        if self.outstanding_errors() > 0 {
            self.status = Status::FinishedWithErrors;
            self.guidance = Guidance::FixErrors;
            return None;
        }

        self.status = Status::Complete;
        self.guidance = Guidance::Completed;
        if self.finish_emitted {
            return None;
        }
        self.finish_emitted = true;

        let event = FinishEvent {
            started_at: self.started_at.unwrap_or(now),
            finished_at: now,
            total_error_events: self.total_error_events,
            length: self.len(),
        };
        info!(
            length = event.length,
            errors = event.total_error_events,
            "typing session complete"
        );
        Some(event)
    }
}
