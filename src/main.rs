use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use tinyscheme::interpreter::ast_walk::{json, Value};
use tinyscheme::interpreter::{Error, Interpreter};
use tinyscheme::reader::{lexer, parser};

// sysexits.h
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_NOINPUT: u8 = 66;
const EX_SOFTWARE: u8 = 70;

#[derive(Parser, Debug)]
#[command(name = "scheme", version, about = "A small tree-walking Scheme interpreter")]
struct Cli {
    /// Program to run; `noin` or nothing means no file
    input: Option<PathBuf>,

    /// Enter the REPL after running the input file
    #[arg(short, long)]
    interactive: bool,

    /// Log every top-level form as it is evaluated
    #[arg(short, long)]
    verbose: bool,

    /// Print the token stream
    #[arg(short, long)]
    tokens: bool,

    /// Print the parsed program as JSON
    #[arg(short, long)]
    cst: bool,

    /// Start from the bare primitives, without the Scheme prelude
    #[arg(long)]
    no_prelude: bool,

    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long, env = "SCHEME_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn input_file(&self) -> Option<&Path> { self.input.as_deref().filter(|p| *p != Path::new("noin")) }
}

fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = match cli.verbose {
        true => EnvFilter::new("debug"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_timer(ChronoLocal::rfc_3339());

    match cli.log_dir {
        Some(ref dir) => {
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "scheme.log"));
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    }
}

/// Lex, parse and evaluate one piece of source, dumping the intermediate
/// forms when asked to.
fn run_source(interpreter: &Interpreter, src: &str, cli: &Cli) -> Result<Value, Error> {
    let tokens = lexer::tokenize(src)?;
    if cli.tokens {
        for token in &tokens {
            println!("{}", token);
        }
    }

    let program = parser::parse(&tokens)?;
    if cli.cst {
        match json::to_json_pretty(&program) {
            Ok(dump) => println!("{}", dump),
            Err(e) => warn!("can't dump parse tree: {}", e),
        }
    }

    debug!("evaluating {}", program);
    interpreter.run(&program)
}

fn run_file(interpreter: &Interpreter, path: &Path, cli: &Cli) -> Result<(), ExitCode> {
    info!("loading {}", path.display());
    let src = fs::read_to_string(path).map_err(|e| {
        error!("can't read {}: {}", path.display(), e);
        eprintln!("{}: {}", path.display(), e);
        ExitCode::from(EX_NOINPUT)
    })?;

    run_source(interpreter, &src, cli).map(|_| ()).map_err(|e| {
        eprintln!("{}", e);
        ExitCode::from(EX_DATAERR)
    })
}

fn repl(interpreter: &Interpreter, cli: &Cli) {
    let mut line_editor = Reedline::create();
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("scheme".to_string()), DefaultPromptSegment::Empty);

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match run_source(interpreter, &line, cli) {
                    Ok(Value::Empty) => {}
                    Ok(value) => println!("{}", value),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Ok(_) => break,
            Err(e) => {
                error!("reading input: {}", e);
                break;
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.use_stderr() {
                true => ExitCode::from(EX_USAGE),
                false => ExitCode::SUCCESS,
            };
        }
    };
    let _guard = init_logging(&cli);

    let interpreter = match cli.no_prelude {
        true => Interpreter::new(),
        false => match Interpreter::with_prelude() {
            Ok(interpreter) => interpreter,
            Err(e) => {
                error!("prelude failed: {}", e);
                eprintln!("prelude failed: {}", e);
                return ExitCode::from(EX_SOFTWARE);
            }
        },
    };

    let input = cli.input_file();
    if let Some(path) = input {
        if let Err(code) = run_file(&interpreter, path, &cli) {
            return code;
        }
    }
    if cli.interactive || input.is_none() {
        repl(&interpreter, &cli);
    }
    ExitCode::SUCCESS
}
