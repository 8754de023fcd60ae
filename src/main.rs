use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox as lox;

use lox::ast_printer::{AstPrinter, RpnPrinter};
use lox::error::{LoxError, RunError, EXIT_FORMAT_ERROR};
use lox::interpreter::Interpreter;
use lox::stmt::Stmt;
use lox::value::Value;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its syntax tree
    Parse {
        filename: Option<PathBuf>,

        /// Print expressions in postfix (reverse Polish) form
        #[arg(long)]
        rpn: bool,
    },

    /// Runs input from a file and prints the value of its final expression
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program; starts a prompt without one
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report_all(errors: &[LoxError]) {
    for e in errors {
        eprintln!("{}", e);
    }
}

fn report(error: &RunError) {
    match error {
        RunError::Static(errors) => report_all(errors),
        RunError::Runtime(e) => eprintln!("{}", e),
    }
}

fn no_input() {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = lox::scanner::scan(&source);

    report_all(&errors);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code {}", EXIT_FORMAT_ERROR);
        std::process::exit(EXIT_FORMAT_ERROR);
    }

    Ok(())
}

fn parse(filename: PathBuf, rpn: bool) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, mut errors) = lox::scanner::scan(&source);
    let (statements, parse_errors) = lox::parser::parse(&tokens);
    errors.extend(parse_errors);

    if !errors.is_empty() {
        report_all(&errors);
        std::process::exit(EXIT_FORMAT_ERROR);
    }

    for stmt in &statements {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print { value: expr, .. } if rpn => {
                println!("{}", RpnPrinter.print(expr))
            }
            _ => println!("{}", AstPrinter.print_stmt(stmt)),
        }
    }

    Ok(())
}

fn run_file(filename: PathBuf, print_result: bool) -> Result<()> {
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut interpreter = Interpreter::new();

    match lox::run(&source, &mut interpreter) {
        Ok(value) => {
            info!("Program executed successfully");
            if print_result {
                println!("{}", value);
            }
        }
        Err(e) => {
            debug!("Run failed: {}", e);
            report(&e);
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

/// One pipeline run per input line; globals survive between lines.
fn repl() -> Result<()> {
    info!("Starting REPL");

    let stdin = io::stdin();
    let mut interpreter = Interpreter::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            info!("End of input, leaving REPL");
            println!();
            return Ok(());
        }

        match lox::run(line.trim(), &mut interpreter) {
            Ok(Value::Nil) => {}
            Ok(value) => println!("{}", value),
            Err(e) => report(&e),
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => tokenize(filename, json)?,
            None => no_input(),
        },

        Commands::Parse { filename, rpn } => match filename {
            Some(filename) => parse(filename, rpn)?,
            None => no_input(),
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => run_file(filename, true)?,
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => run_file(filename, false)?,
            None => repl()?,
        },

        Commands::Repl => repl()?,
    }

    Ok(())
}
