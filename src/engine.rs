// src/engine.rs

//! The engine: one PTY session, one parser, one screen, one dispatcher,
//! all owned and mutated by a single thread.
//!
//! The embedder's event loop calls [`Engine::pump`] when the PTY fd is
//! readable and [`Engine::tick`] when the dispatch timer fires. Pumping
//! drains and applies everything available without blocking; however
//! much arrives, subscribers see at most one change batch per tick.

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use std::io::{ErrorKind, Read, Write};

use crate::ansi::parser::Parser;
use crate::color::Palette;
use crate::config::Config;
use crate::keys::{KeySymbol, Modifiers};
use crate::os::pty::{ChildExit, PtyConfig, PtySession};
use crate::term::dispatch::ChangeBatch;
use crate::term::input::{encode_key, encode_paste};
use crate::term::screen::Screen;
use crate::term::snapshot::ScreenSnapshot;
use crate::term::{ChangeDispatcher, EngineAction, EngineEvent};

const READ_CHUNK: usize = 4096;

pub struct Engine {
    pty: PtySession,
    parser: Parser,
    screen: Screen,
    dispatcher: ChangeDispatcher,
    palette: Palette,
    /// Bytes accepted for the child but not yet written (partial or
    /// would-block writes). Order is preserved.
    pending_out: Vec<u8>,
}

impl Engine {
    /// Spawns the configured shell and builds the engine around it.
    /// Spawn failure is fatal; no partially initialized engine exists.
    pub fn new(config: &Config, cols: u16, rows: u16) -> Result<Self> {
        let program = config.shell.resolve_program();
        let args: Vec<&str> = config.shell.args.iter().map(String::as_str).collect();
        let pty = PtySession::spawn(&PtyConfig {
            command_executable: &program,
            args: &args,
            initial_cols: cols.max(1),
            initial_rows: rows.max(1),
        })
        .with_context(|| format!("spawning {}", program))?;
        Ok(Engine {
            pty,
            parser: Parser::new(),
            screen: Screen::new(cols as usize, rows as usize, config),
            dispatcher: ChangeDispatcher::new(),
            palette: Palette::new(config.colors.foreground, config.colors.background),
            pending_out: Vec::new(),
        })
    }

    /// Resolves style colors (indexed and default slots) to concrete
    /// values for the renderer.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        self.screen.snapshot()
    }

    pub fn child_exit(&self) -> Option<ChildExit> {
        self.pty.child_exit()
    }

    pub fn dispatcher_mut(&mut self) -> &mut ChangeDispatcher {
        &mut self.dispatcher
    }

    /// Version of the last flushed change batch, for pollers.
    pub fn change_version(&self) -> u64 {
        self.dispatcher.version()
    }

    /// Drains all currently available PTY output, parses and applies it,
    /// and arms one dispatch. Never blocks: returns when the fd would
    /// block. Returns the out-of-band events the drain produced.
    pub fn pump(&mut self) -> Result<Vec<EngineEvent>> {
        let mut events = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match self.pty.read(&mut buf) {
                Ok(0) => {
                    let already_reported = self.pty.child_exit().is_some();
                    if let Some(exit) = self.pty.try_wait() {
                        if !already_reported {
                            debug!("child exited: {:?}", exit);
                            events.push(EngineEvent::ChildExited(exit));
                        }
                    }
                    break;
                }
                Ok(n) => {
                    for command in self.parser.feed(&buf[..n]) {
                        if let Some(action) = self.screen.apply(command) {
                            self.handle_action(action, &mut events);
                        }
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) => return Err(err).context("reading PTY master"),
            }
        }
        self.flush_pending_writes()?;
        self.arm_dispatch();
        Ok(events)
    }

    fn handle_action(&mut self, action: EngineAction, events: &mut Vec<EngineEvent>) {
        match action {
            EngineAction::WritePty(reply) => {
                if self.pty.child_exit().is_none() {
                    self.pending_out.extend_from_slice(&reply);
                }
            }
            EngineAction::Bell => events.push(EngineEvent::Bell),
            EngineAction::SetTitle(title) => events.push(EngineEvent::TitleChanged(title)),
        }
    }

    /// The dispatch timer fired: flush at most one change batch. Pending
    /// child-bound bytes get another write attempt first.
    pub fn tick(&mut self) -> Option<ChangeBatch> {
        if let Err(err) = self.flush_pending_writes() {
            warn!("write to child failed: {:#}", err);
        }
        self.dispatcher.flush(self.screen.run_store_mut())
    }

    /// Encodes one key event and writes it to the child. Rejected once
    /// the child has exited.
    pub fn send_key(&mut self, symbol: KeySymbol, mods: Modifiers) -> Result<()> {
        let bytes = encode_key(symbol, mods, self.screen.modes().cursor_keys_app_mode);
        self.send_bytes(bytes)
    }

    /// Writes pasted text, bracketed when the child asked for it.
    pub fn paste(&mut self, text: &str) -> Result<()> {
        let bytes = encode_paste(text, self.screen.modes().bracketed_paste);
        self.send_bytes(bytes)
    }

    fn send_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        if self.pty.child_exit().is_some() {
            bail!("child process has exited; input rejected");
        }
        if bytes.is_empty() {
            return Ok(());
        }
        self.pending_out.extend_from_slice(&bytes);
        self.flush_pending_writes()
    }

    /// Writes as much queued output as the PTY accepts, retrying the
    /// remainder later without reordering.
    fn flush_pending_writes(&mut self) -> Result<()> {
        while !self.pending_out.is_empty() {
            match self.pty.write(&self.pending_out) {
                Ok(0) => break,
                Ok(n) => {
                    self.pending_out.drain(..n);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) => return Err(err).context("writing to PTY master"),
            }
        }
        Ok(())
    }

    /// Resizes grid and PTY together. The returned event carries the
    /// pre-resize cursor row and scrollback height.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<EngineEvent> {
        let event = self.screen.resize(cols as usize, rows as usize);
        self.pty
            .resize(cols.max(1), rows.max(1))
            .context("propagating resize to PTY")?;
        self.arm_dispatch();
        Ok(event)
    }

    fn arm_dispatch(&mut self) {
        let damage = self.screen.take_damage();
        if !damage.is_empty() {
            self.dispatcher.absorb(damage);
            self.dispatcher.schedule();
        }
    }

    /// Tears down in dependency order: no armed dispatch may fire
    /// against freed state, and the child's process group dies before
    /// the fd closes.
    pub fn shutdown(&mut self) {
        self.dispatcher.cancel();
        self.pty.shutdown();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    fn pump_until<F: Fn(&Engine) -> bool>(engine: &mut Engine, done: F) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            events.extend(engine.pump().unwrap());
            engine.tick();
            if done(engine) {
                return events;
            }
            sleep(Duration::from_millis(10));
        }
        panic!("condition not reached; events so far: {:?}", events);
    }

    fn engine_running(command: &str) -> Engine {
        let mut config = Config::default();
        config.shell.program = "/bin/sh".to_string();
        config.shell.args = vec!["-c".to_string(), command.to_string()];
        Engine::new(&config, 80, 24).unwrap()
    }

    #[test]
    fn child_output_lands_on_the_grid() {
        let mut engine = engine_running("printf hello-engine");
        pump_until(&mut engine, |engine| {
            engine
                .screen()
                .line_text(0)
                .is_some_and(|line| line.starts_with("hello-engine"))
        });
    }

    #[test]
    fn child_exit_preserves_grid_and_rejects_input() {
        let mut engine = engine_running("printf done; exit 0");
        let events = pump_until(&mut engine, |engine| engine.child_exit().is_some());
        assert!(events
            .iter()
            .any(|event| matches!(event, EngineEvent::ChildExited(ChildExit::Exited(0)))));
        // Final output stays inspectable.
        assert!(engine.screen().line_text(0).unwrap().starts_with("done"));
        assert!(engine.send_key(KeySymbol::Char('x'), Modifiers::empty()).is_err());
        assert!(engine.paste("text").is_err());
    }

    #[test]
    fn pump_then_tick_yields_one_batch() {
        let mut engine = engine_running("printf 'a\\nb\\nc'");
        pump_until(&mut engine, |engine| {
            engine.screen().line_text(2).is_some_and(|line| line.starts_with('c'))
        });
        // Everything already flushed by pump_until's ticks.
        assert!(engine.tick().is_none());
    }

    #[test]
    fn resize_reports_pre_mutation_state() {
        let mut engine = engine_running("sleep 5");
        let event = engine.resize(40, 10).unwrap();
        assert_eq!(
            event,
            EngineEvent::ResizePending {
                cursor_row: 0,
                scrollback_len: 0
            }
        );
        assert_eq!(engine.screen().width(), 40);
        assert_eq!(engine.screen().height(), 10);
    }
}
