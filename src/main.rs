use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{LevelFilter, error, info, warn};

use synacor_vm::config;
use synacor_vm::disasm::disassemble;
use synacor_vm::logging;
use synacor_vm::vm::io::{StdIo, StdinLines};
use synacor_vm::vm::loader::load_file;
use synacor_vm::vm::snapshot::read_checkpoint;
use synacor_vm::vm::trace::TraceSink;
use synacor_vm::vm::{DebugController, Dispatcher, MachineState};

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Mode,

    /// Debug filter to specify log topics (e.g., "vm,instructions,debugger,snapshot")
    #[arg(long, global = true)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Execute a program image
    Run {
        /// Program image (little-endian 16-bit words)
        #[arg(required_unless_present = "resume")]
        program: Option<PathBuf>,

        /// Start from a checkpoint instead of a program image
        #[arg(long, conflicts_with = "program")]
        resume: Option<PathBuf>,

        /// Suspend before executing the instruction at this address
        #[arg(long)]
        break_at: Option<u16>,

        /// Open the debug console before the first instruction
        #[arg(long)]
        debug: bool,

        /// Start with instruction tracing enabled
        #[arg(long)]
        trace: bool,

        /// File trace records are appended to, created on the first record
        #[arg(long, default_value = config::DEFAULT_TRACE_PATH)]
        trace_file: PathBuf,

        /// Where the console's save command writes
        #[arg(long, default_value = config::DEFAULT_CHECKPOINT_PATH)]
        checkpoint: PathBuf,

        /// Stack depth treated as a runaway program
        #[arg(long, default_value_t = config::MAX_CALL_STACK_DEPTH)]
        max_stack_depth: usize,

        /// Open the debug console after a fault halt
        #[arg(long)]
        post_mortem: bool,
    },
    /// Print a program image as instructions
    Disassemble {
        program: PathBuf,

        #[arg(long, default_value_t = 0)]
        start: usize,

        #[arg(long, default_value_t = config::MEMORY_SIZE)]
        end: usize,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };

    if let Err(e) = logging::init_logger(log_level, args.debug_filter) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let result = match args.command {
        Mode::Run {
            program,
            resume,
            break_at,
            debug,
            trace,
            trace_file,
            checkpoint,
            max_stack_depth,
            post_mortem,
        } => {
            let options = RunOptions {
                program,
                resume,
                break_at,
                debug,
                trace,
                trace_file,
                checkpoint,
                max_stack_depth,
                post_mortem,
            };
            run(options)
        }
        Mode::Disassemble {
            program,
            start,
            end,
        } => load_file(&program)
            .map(|memory| {
                for line in disassemble(memory.view(), start, end) {
                    println!("{}", line);
                }
                ExitCode::SUCCESS
            })
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct RunOptions {
    program: Option<PathBuf>,
    resume: Option<PathBuf>,
    break_at: Option<u16>,
    debug: bool,
    trace: bool,
    trace_file: PathBuf,
    checkpoint: PathBuf,
    max_stack_depth: usize,
    post_mortem: bool,
}

fn run(opts: RunOptions) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut state = match (&opts.resume, &opts.program) {
        (Some(path), _) => read_checkpoint(path, opts.max_stack_depth)?,
        (None, Some(program)) => {
            MachineState::with_stack_depth(load_file(program)?, opts.max_stack_depth)
        }
        (None, None) => return Err("either a program image or --resume is required".into()),
    };
    info!("Starting at ip {}", state.ip);

    let mut controller = DebugController::new(StdinLines::default(), io::stderr())
        .with_breakpoint(opts.break_at)
        .with_trace(TraceSink::to_file(opts.trace_file), opts.trace)
        .with_checkpoint_path(opts.checkpoint)
        .with_post_mortem(opts.post_mortem);
    if opts.debug {
        controller.signal().raise();
    }

    // Ctrl-C opens the console at the next instruction boundary
    let signal = controller.signal();
    if let Err(e) = ctrlc::set_handler(move || signal.raise()) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut dispatcher = Dispatcher::new();
    let mut io = StdIo::stdio();
    let reason = controller.run(&mut dispatcher, &mut state, &mut io)?;
    info!("Halted after {} instructions: {:?}", dispatcher.steps(), reason);

    if reason.is_fault() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
