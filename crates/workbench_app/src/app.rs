use std::io::{self, Write};

use workbench_core::{update, AppState, AppViewModel, Effect, Msg};

use crate::render;

/// Owns the state machine and prints what changed after every message.
pub struct Workbench<W> {
    state: AppState,
    out: W,
}

impl Workbench<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Workbench<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: AppState::new(),
            out,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let notifications = state.drain_notifications();
        let view = state.view();
        self.state = state;

        for notification in &notifications {
            let _ = writeln!(self.out, "{}", render::notification_line(notification));
        }
        if was_dirty {
            if let Some(line) = render::status_line(&view) {
                let _ = writeln!(self.out, "{line}");
            }
        }
        effects
    }
}
