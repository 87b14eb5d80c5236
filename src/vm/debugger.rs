// Debug controller: wraps Dispatcher::step with breakpoints, an external suspend
// signal, tracing and an interactive console

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use super::dispatcher::{Dispatcher, HaltReason, Status};
use super::error::CommandError;
use super::io::IoChannel;
use super::snapshot;
use super::state::MachineState;
use super::trace::TraceSink;
use crate::config::{self, MAX_WORD, REGISTER_COUNT};

/// Cloneable handle that asks a running machine to suspend at its next
/// instruction boundary
#[derive(Debug, Clone, Default)]
pub struct SuspendSignal(Arc<AtomicBool>);

impl SuspendSignal {
    pub fn new() -> Self {
        SuspendSignal::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the signal, reporting whether it was set
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Console commands, one letter each
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Halt,
    Dump,
    DumpRegisters,
    ToggleTrace,
    Breakpoint(Option<u16>),
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
    SetRegister(usize, u16),
    Jump(u16),
    Poke(u16, u16),
    Resume,
}

impl Command {
    /// Parses one console line. Unknown input means resume.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(selector) = parts.next() else {
            return Ok(Command::Resume);
        };
        let mut chars = selector.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Ok(Command::Resume),
        };
        let args: Vec<&str> = parts.collect();

        let cmd = match letter {
            'q' => Command::Halt,
            'd' => Command::Dump,
            'r' => Command::DumpRegisters,
            't' => Command::ToggleTrace,
            'b' => Command::Breakpoint(match args.first() {
                Some(addr) => Some(parse_number(addr, MAX_WORD)?),
                None => None,
            }),
            's' => Command::Save(args.first().map(PathBuf::from)),
            'l' => Command::Load(args.first().map(PathBuf::from)),
            'w' => {
                let reg = args
                    .first()
                    .ok_or(CommandError::MissingArgument('w', "<reg> <value>"))?;
                let value = args
                    .get(1)
                    .ok_or(CommandError::MissingArgument('w', "<reg> <value>"))?;
                Command::SetRegister(parse_register(reg)?, parse_number(value, MAX_WORD)?)
            }
            'j' => {
                let addr = args
                    .first()
                    .ok_or(CommandError::MissingArgument('j', "<addr>"))?;
                Command::Jump(parse_number(addr, MAX_WORD)?)
            }
            'm' => {
                let addr = args
                    .first()
                    .ok_or(CommandError::MissingArgument('m', "<addr> <value>"))?;
                let value = args
                    .get(1)
                    .ok_or(CommandError::MissingArgument('m', "<addr> <value>"))?;
                Command::Poke(parse_number(addr, MAX_WORD)?, parse_number(value, u16::MAX)?)
            }
            _ => Command::Resume,
        };
        Ok(cmd)
    }
}

fn parse_number(text: &str, max: u16) -> Result<u16, CommandError> {
    text.parse::<u16>()
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| CommandError::BadNumber(text.to_string(), max))
}

fn parse_register(text: &str) -> Result<usize, CommandError> {
    let digits = text
        .strip_prefix("reg")
        .or_else(|| text.strip_prefix('r'))
        .unwrap_or(text);
    digits
        .parse::<usize>()
        .ok()
        .filter(|r| *r < REGISTER_COUNT)
        .ok_or_else(|| CommandError::BadRegister(text.to_string()))
}

const HELP: &str = "q halt | d dump | r registers | t trace | b [addr] breakpoint | \
s [path] save | l [path] load | w <reg> <value> | j <addr> | m <addr> <value> | other: continue";

/// Registers, stack and instruction pointer
pub fn format_registers(state: &MachineState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ip: {}", state.ip);
    for (i, value) in state.registers.view().iter().enumerate() {
        let _ = writeln!(out, "reg{}: {}", i, value);
    }
    let _ = writeln!(
        out,
        "stack ({}/{}): {:?}",
        state.stack.len(),
        state.stack.max_depth(),
        state.stack.view()
    );
    out
}

/// Full state, memory as rows of 16 words; runs of all-zero rows collapse to `*`
pub fn format_state(state: &MachineState) -> String {
    let mut out = format_registers(state);
    let mut skipping = false;
    for (row, words) in state.memory.view().chunks(16).enumerate() {
        if words.iter().all(|w| *w == 0) {
            if !skipping {
                out.push_str("*\n");
                skipping = true;
            }
            continue;
        }
        skipping = false;
        let cells: Vec<String> = words.iter().map(|w| format!("{:5}", w)).collect();
        let _ = writeln!(out, "{:05}: {}", row * 16, cells.join(" "));
    }
    out
}

enum SessionFlow {
    Stay,
    Leave,
}

/// Drives a Dispatcher, stopping between instructions for the console
pub struct DebugController<R, W> {
    console_in: R,
    console_out: W,
    signal: SuspendSignal,
    breakpoint: Option<u16>,
    // Address the last suspension happened at; its breakpoint stays quiet until ip moves
    suspended_at: Option<u16>,
    trace: Option<TraceSink>,
    tracing: bool,
    checkpoint_path: PathBuf,
    post_mortem: bool,
}

impl<R: BufRead, W: Write> DebugController<R, W> {
    pub fn new(console_in: R, console_out: W) -> Self {
        DebugController {
            console_in,
            console_out,
            signal: SuspendSignal::new(),
            breakpoint: None,
            suspended_at: None,
            trace: None,
            tracing: false,
            checkpoint_path: PathBuf::from(config::DEFAULT_CHECKPOINT_PATH),
            post_mortem: false,
        }
    }

    pub fn with_breakpoint(mut self, breakpoint: Option<u16>) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    pub fn with_trace(mut self, sink: TraceSink, enabled: bool) -> Self {
        self.trace = Some(sink);
        self.tracing = enabled;
        self
    }

    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    /// Open the console once more after a fault halt
    pub fn with_post_mortem(mut self, enabled: bool) -> Self {
        self.post_mortem = enabled;
        self
    }

    /// Handle for requesting suspension from elsewhere
    pub fn signal(&self) -> SuspendSignal {
        self.signal.clone()
    }

    pub fn breakpoint(&self) -> Option<u16> {
        self.breakpoint
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    pub fn into_console(self) -> (R, W) {
        (self.console_in, self.console_out)
    }

    /// Runs until the machine halts
    pub fn run(
        &mut self,
        dispatcher: &mut Dispatcher,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
    ) -> io::Result<HaltReason> {
        loop {
            if let Status::Halted(reason) = dispatcher.status() {
                if self.post_mortem && reason.is_fault() {
                    writeln!(self.console_out, "-- halted: {} --", describe(reason))?;
                    self.session(dispatcher, state)?;
                }
                if let Some(trace) = self.trace.as_mut() {
                    trace.flush()?;
                }
                return Ok(reason);
            }

            if dispatcher.status() == Status::Suspended || self.should_suspend(state.ip) {
                dispatcher.suspend();
                self.suspended_at = Some(state.ip);
                let _ = io.flush();
                writeln!(self.console_out, "-- suspended at {} --", state.ip)?;
                self.session(dispatcher, state)?;
                continue;
            }

            let address = state.ip;
            // A fault halts the dispatcher; the next pass reports it
            if let Ok(instr) = dispatcher.step(state, io) {
                self.suspended_at = None;
                if self.tracing {
                    if let Some(trace) = self.trace.as_mut() {
                        trace.record(address, &instr, state)?;
                    }
                }
            }
        }
    }

    /// Suspension is checked before decode, never mid-instruction
    fn should_suspend(&self, ip: u16) -> bool {
        if self.signal.take() {
            crate::debug_debugger!("Suspend signal received at ip {}", ip);
            return true;
        }
        self.breakpoint == Some(ip) && self.suspended_at != Some(ip)
    }

    fn session(&mut self, dispatcher: &mut Dispatcher, state: &mut MachineState) -> io::Result<()> {
        loop {
            write!(self.console_out, "debug> ")?;
            self.console_out.flush()?;

            let mut line = String::new();
            if self.console_in.read_line(&mut line)? == 0 {
                // Console closed
                dispatcher.resume();
                return Ok(());
            }

            match Command::parse(line.trim()) {
                Ok(cmd) => {
                    crate::debug_debugger!("Console command {:?}", cmd);
                    if let SessionFlow::Leave = self.apply(cmd, dispatcher, state)? {
                        return Ok(());
                    }
                }
                Err(err) => {
                    writeln!(self.console_out, "{}", err)?;
                    writeln!(self.console_out, "{}", HELP)?;
                }
            }
        }
    }

    fn apply(
        &mut self,
        cmd: Command,
        dispatcher: &mut Dispatcher,
        state: &mut MachineState,
    ) -> io::Result<SessionFlow> {
        match cmd {
            Command::Halt => {
                if !matches!(dispatcher.status(), Status::Halted(_)) {
                    dispatcher.halt(HaltReason::Debugger);
                }
                return Ok(SessionFlow::Leave);
            }
            Command::Resume => {
                dispatcher.resume();
                return Ok(SessionFlow::Leave);
            }
            Command::Dump => write!(self.console_out, "{}", format_state(state))?,
            Command::DumpRegisters => write!(self.console_out, "{}", format_registers(state))?,
            Command::ToggleTrace => {
                if self.trace.is_none() {
                    writeln!(self.console_out, "no trace sink configured")?;
                } else {
                    self.tracing = !self.tracing;
                    info!(target: "debugger", "Tracing {}", if self.tracing { "on" } else { "off" });
                    writeln!(
                        self.console_out,
                        "trace {}",
                        if self.tracing { "on" } else { "off" }
                    )?;
                }
            }
            Command::Breakpoint(addr) => {
                self.breakpoint = addr;
                match addr {
                    Some(a) => writeln!(self.console_out, "breakpoint at {}", a)?,
                    None => writeln!(self.console_out, "breakpoint cleared")?,
                }
            }
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| self.checkpoint_path.clone());
                match snapshot::write_checkpoint(state, &path) {
                    Ok(()) => writeln!(self.console_out, "saved {}", path.display())?,
                    Err(err) => {
                        warn!(target: "debugger", "Checkpoint save failed: {}", err);
                        writeln!(self.console_out, "save failed: {}", err)?;
                    }
                }
            }
            Command::Load(path) => {
                let path = path.unwrap_or_else(|| self.checkpoint_path.clone());
                match snapshot::read_checkpoint(&path, state.stack.max_depth()) {
                    Ok(restored) => {
                        *state = restored;
                        writeln!(self.console_out, "loaded {} (ip {})", path.display(), state.ip)?;
                    }
                    Err(err) => {
                        warn!(target: "debugger", "Checkpoint load failed: {}", err);
                        writeln!(self.console_out, "load failed: {}", err)?;
                    }
                }
            }
            Command::SetRegister(reg, value) => match state.registers.set(reg, value) {
                Ok(()) => writeln!(self.console_out, "reg{} = {}", reg, value)?,
                Err(err) => writeln!(self.console_out, "write failed: {}", err)?,
            },
            Command::Jump(addr) => {
                state.ip = addr;
                writeln!(self.console_out, "ip = {}", addr)?;
            }
            Command::Poke(addr, value) => match state.memory.write(addr as usize, value) {
                Ok(()) => writeln!(self.console_out, "[{}] = {}", addr, value)?,
                Err(err) => writeln!(self.console_out, "write failed: {}", err)?,
            },
        }
        Ok(SessionFlow::Stay)
    }
}

fn describe(reason: HaltReason) -> String {
    match reason {
        HaltReason::Fault(fault) => fault.to_string(),
        other => format!("{:?}", other),
    }
}
