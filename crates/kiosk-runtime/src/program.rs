#![forbid(unsafe_code)]

//! Model/update/command contract and the real-time program loop.
//!
//! # Example
//!
//! ```ignore
//! use kiosk_runtime::{Cmd, Model};
//! use kiosk_core::event::Event;
//! use std::time::Duration;
//!
//! struct Blinker { on: bool }
//!
//! enum Msg { Blink, Input(Event) }
//!
//! impl From<Event> for Msg {
//!     fn from(e: Event) -> Self { Msg::Input(e) }
//! }
//!
//! impl Model for Blinker {
//!     type Message = Msg;
//!
//!     fn init(&mut self) -> Cmd<Msg> {
//!         Cmd::schedule("blink", Duration::from_millis(500), Msg::Blink)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Blink => {
//!                 self.on = !self.on;
//!                 Cmd::schedule("blink", Duration::from_millis(500), Msg::Blink)
//!             }
//!             Msg::Input(_) => Cmd::none(),
//!         }
//!     }
//! }
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use kiosk_core::event::Event;
use tracing::{debug, info, warn};

use crate::scheduler::{Clock, Scheduler, SystemClock};
use crate::state_persistence::StateRegistry;

/// Identifies a timer. Scheduling a key again replaces the pending timer.
pub type TimerKey = &'static str;

/// Application state and behavior.
pub trait Model: Sized {
    /// Messages the model reacts to. Terminal input converts into them.
    type Message: From<Event> + Send + 'static;

    /// Startup commands. Called once before any message.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// The state transition function.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Called once when the program stops. Timers returned here are dropped;
    /// `SaveState` and `Log` still run.
    fn shutdown(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }
}

/// Side effects requested by `init`, `update` and `shutdown`.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Stop the program.
    Quit,
    /// Execute commands in order.
    Batch(Vec<Cmd<M>>),
    /// Feed a message straight back into `update`.
    Msg(M),
    /// Emit a log line.
    Log(String),
    /// Deliver `msg` after `after`, replacing any timer under `key`.
    Schedule {
        key: TimerKey,
        after: Duration,
        msg: M,
    },
    /// Drop the timer under the key, if any.
    Cancel(TimerKey),
    /// Flush the state registry to its backend.
    SaveState,
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Schedule { key, after, msg } => f
                .debug_struct("Schedule")
                .field("key", key)
                .field("after", after)
                .field("msg", msg)
                .finish(),
            Self::Cancel(key) => f.debug_tuple("Cancel").field(key).finish(),
            Self::SaveState => write!(f, "SaveState"),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    #[inline]
    pub fn schedule(key: TimerKey, after: Duration, msg: M) -> Self {
        Self::Schedule { key, after, msg }
    }

    #[inline]
    pub fn cancel(key: TimerKey) -> Self {
        Self::Cancel(key)
    }

    #[inline]
    pub fn save_state() -> Self {
        Self::SaveState
    }

    /// Combine commands. Empty and single-element lists collapse, and
    /// `None` entries are dropped.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Stable name for tracing.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::Log(_) => "Log",
            Self::Schedule { .. } => "Schedule",
            Self::Cancel(_) => "Cancel",
            Self::SaveState => "SaveState",
        }
    }

    /// Convert the message type, so a component's commands can be lifted
    /// into its parent's.
    pub fn map<N>(self, f: impl Fn(M) -> N) -> Cmd<N> {
        self.map_with(&f)
    }

    fn map_with<N, F: Fn(M) -> N>(self, f: &F) -> Cmd<N> {
        match self {
            Self::None => Cmd::None,
            Self::Quit => Cmd::Quit,
            Self::Batch(cmds) => Cmd::Batch(cmds.into_iter().map(|c| c.map_with(f)).collect()),
            Self::Msg(m) => Cmd::Msg(f(m)),
            Self::Log(s) => Cmd::Log(s),
            Self::Schedule { key, after, msg } => Cmd::Schedule {
                key,
                after,
                msg: f(msg),
            },
            Self::Cancel(key) => Cmd::Cancel(key),
            Self::SaveState => Cmd::SaveState,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// Input and output for a running [`Program`].
pub trait Frontend<M: Model> {
    /// Wait up to `timeout` for the next input event.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>>;

    /// Draw the model.
    fn present(&mut self, model: &M) -> io::Result<()>;

    /// Turn one input event into the messages to dispatch, in order. A
    /// frontend that hit-tests what it drew overrides this.
    fn interpret(&mut self, event: Event) -> Vec<M::Message> {
        vec![M::Message::from(event)]
    }
}

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Longest single wait for input, even with no timer due.
    pub max_poll: Duration,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            max_poll: Duration::from_millis(250),
        }
    }
}

impl ProgramConfig {
    pub fn with_max_poll(mut self, max_poll: Duration) -> Self {
        self.max_poll = max_poll;
        self
    }
}

/// Drives a [`Model`] in real time.
pub struct Program<M: Model, F: Frontend<M>> {
    model: M,
    frontend: F,
    scheduler: Scheduler<M::Message>,
    clock: SystemClock,
    registry: Option<Arc<StateRegistry>>,
    config: ProgramConfig,
    running: bool,
    dirty: bool,
}

impl<M: Model, F: Frontend<M>> Program<M, F> {
    pub fn new(model: M, frontend: F) -> Self {
        Self {
            model,
            frontend,
            scheduler: Scheduler::new(),
            clock: SystemClock::new(),
            registry: None,
            config: ProgramConfig::default(),
            running: true,
            dirty: true,
        }
    }

    /// Route `Cmd::SaveState` through `registry`.
    pub fn with_registry(mut self, registry: Arc<StateRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_config(mut self, config: ProgramConfig) -> Self {
        self.config = config;
        self
    }

    /// Run until the model quits or the frontend fails, then run the model's
    /// shutdown hook. Returns the model.
    pub fn run(mut self) -> io::Result<M> {
        info!(target: "kiosk::runtime", "program start");
        let cmd = self.model.init();
        self.execute(cmd);

        let result = self.event_loop();

        let cmd = self.model.shutdown();
        self.scheduler.clear();
        self.running = false;
        self.execute(cmd);
        info!(target: "kiosk::runtime", ok = result.is_ok(), "program stop");
        result.map(|()| self.model)
    }

    fn event_loop(&mut self) -> io::Result<()> {
        while self.running {
            if self.dirty {
                self.frontend.present(&self.model)?;
                self.dirty = false;
            }

            let now = self.clock.now();
            let timeout = self
                .scheduler
                .next_deadline()
                .map_or(self.config.max_poll, |d| {
                    d.saturating_sub(now).min(self.config.max_poll)
                });

            if let Some(event) = self.frontend.poll_event(timeout)? {
                for msg in self.frontend.interpret(event) {
                    if !self.running {
                        break;
                    }
                    self.dispatch(msg);
                }
            }

            let now = self.clock.now();
            while self.running {
                let Some((key, _, msg)) = self.scheduler.pop_due(now) else {
                    break;
                };
                debug!(target: "kiosk::runtime", key, "timer fired");
                self.dispatch(msg);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.dirty = true;
        self.execute(cmd);
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute(c);
                }
            }
            Cmd::Msg(m) => self.dispatch(m),
            Cmd::Log(text) => info!(target: "kiosk::app", "{text}"),
            Cmd::Schedule { key, after, msg } => {
                if self.running {
                    self.scheduler.schedule(key, self.clock.now(), after, msg);
                }
            }
            Cmd::Cancel(key) => {
                self.scheduler.cancel(key);
            }
            Cmd::SaveState => {
                if let Some(registry) = &self.registry
                    && let Err(e) = registry.flush()
                {
                    warn!(target: "kiosk::runtime", error = %e, "state flush failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, PartialEq)]
    enum Msg {
        A,
        B(u8),
        Input,
    }

    impl From<Event> for Msg {
        fn from(_: Event) -> Self {
            Msg::Input
        }
    }

    #[test]
    fn batch_collapses() {
        assert!(Cmd::<Msg>::batch(vec![]).is_none());
        assert!(Cmd::<Msg>::batch(vec![Cmd::none(), Cmd::none()]).is_none());
        assert!(matches!(
            Cmd::batch(vec![Cmd::none(), Cmd::msg(Msg::A)]),
            Cmd::Msg(Msg::A)
        ));
        assert!(matches!(
            Cmd::batch(vec![Cmd::msg(Msg::A), Cmd::quit()]),
            Cmd::Batch(v) if v.len() == 2
        ));
    }

    #[test]
    fn map_lifts_messages() {
        let cmd: Cmd<u8> = Cmd::batch(vec![
            Cmd::schedule("t", Duration::from_secs(1), 7),
            Cmd::msg(9),
            Cmd::cancel("u"),
        ]);
        let mapped = cmd.map(Msg::B);
        let Cmd::Batch(items) = mapped else {
            panic!("expected batch");
        };
        assert!(matches!(
            &items[0],
            Cmd::Schedule { key: "t", msg: Msg::B(7), .. }
        ));
        assert!(matches!(&items[1], Cmd::Msg(Msg::B(9))));
        assert!(matches!(&items[2], Cmd::Cancel("u")));
    }

    #[test]
    fn type_names() {
        assert_eq!(Cmd::<Msg>::save_state().type_name(), "SaveState");
        assert_eq!(Cmd::<Msg>::log("x").type_name(), "Log");
    }

    // ---------- Program loop ----------

    struct Scripted {
        events: VecDeque<Event>,
        presents: usize,
    }

    impl<M: Model> Frontend<M> for Scripted {
        fn poll_event(&mut self, _timeout: Duration) -> io::Result<Option<Event>> {
            Ok(self.events.pop_front())
        }

        fn present(&mut self, _model: &M) -> io::Result<()> {
            self.presents += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct QuitOnSecondInput {
        inputs: u32,
        shut_down: bool,
    }

    impl Model for QuitOnSecondInput {
        type Message = Msg;

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            if msg == Msg::Input {
                self.inputs += 1;
                if self.inputs == 2 {
                    return Cmd::quit();
                }
            }
            Cmd::none()
        }

        fn shutdown(&mut self) -> Cmd<Msg> {
            self.shut_down = true;
            Cmd::schedule("late", Duration::ZERO, Msg::A)
        }
    }

    #[test]
    fn program_runs_until_quit_then_shuts_down() {
        let frontend = Scripted {
            events: VecDeque::from(vec![Event::Focus(true); 3]),
            presents: 0,
        };
        let model = Program::new(QuitOnSecondInput::default(), frontend)
            .run()
            .expect("run");
        assert_eq!(model.inputs, 2);
        assert!(model.shut_down);
    }

    struct Expanding(VecDeque<Event>);

    impl Frontend<QuitOnSecondInput> for Expanding {
        fn poll_event(&mut self, _timeout: Duration) -> io::Result<Option<Event>> {
            Ok(self.0.pop_front())
        }

        fn present(&mut self, _model: &QuitOnSecondInput) -> io::Result<()> {
            Ok(())
        }

        fn interpret(&mut self, _event: Event) -> Vec<Msg> {
            vec![Msg::Input, Msg::Input, Msg::Input]
        }
    }

    #[test]
    fn interpreted_messages_stop_at_quit() {
        let frontend = Expanding(VecDeque::from(vec![Event::Focus(true)]));
        let model = Program::new(QuitOnSecondInput::default(), frontend)
            .run()
            .expect("run");
        assert_eq!(model.inputs, 2);
    }
}
