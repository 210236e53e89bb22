use std::env;
use std::path::PathBuf;
use tcl_parser::config::RuntimeConfig;
use tcl_parser::file_processor::FileProcessor;
use tcl_parser::tokens::dump_tokens;
use tcl_parser::utils::SourceMap;
use tcl_parser::{
    filter_for_round_trip, is_complete, logging, parse_command, parse_expression, parse_script,
    EngineFlags, ParseError, ParseState, ScriptOptions, SubstitutionFlags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Command,
    Script,
    Expression,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Text(String),
    File(String),
}

#[derive(Debug, Clone)]
struct CliOptions {
    mode: Mode,
    input: Input,
    engine_flags: EngineFlags,
    substitution_flags: SubstitutionFlags,
    file_name: Option<String>,
    current_line: u32,
    start_index: usize,
    characters: Option<usize>,
    nested: bool,
    syntax: bool,
    strict: bool,
    round_trip: bool,
    no_ready: bool,
    json: bool,
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tclparse");

    if args.len() < 2 || args[1] == "--help" || args[1] == "-help" {
        print_help(program);
        return Ok(());
    }

    let config = match args.iter().position(|a| a == "-config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => RuntimeConfig::load(path)?,
            None => usage_error(program, "-config requires a path"),
        },
        None => RuntimeConfig::default(),
    };

    let options = match parse_args(&args[1..], &config) {
        Ok(options) => options,
        Err(message) => usage_error(program, &message),
    };

    logging::config::init_runtime_preferences(config.logging.clone())?;
    logging::init_global_logging(options.log_file.as_deref())?;

    let (source, file_name) = match &options.input {
        Input::Text(text) => (text.clone(), options.file_name.clone()),
        Input::File(path) => {
            let processor = FileProcessor::from_preferences(&config.file_processor);
            match processor.process_file(path) {
                Ok(result) => {
                    let name = options.file_name.clone().or(Some(result.display_name()));
                    (result.source, name)
                }
                Err(error) => {
                    eprintln!("error[{}]: {}", error.error_code().as_str(), error);
                    std::process::exit(1);
                }
            }
        }
    };

    let (start, length) = match resolve_window(&source, options.start_index, options.characters)
    {
        Ok(window) => window,
        Err(message) => usage_error(program, &message),
    };

    if options.mode == Mode::Complete {
        let complete = is_complete(
            &source,
            start,
            length,
            options.engine_flags,
            options.substitution_flags,
        );
        println!("{}", complete);
        return Ok(());
    }

    let mut state = ParseState::new(options.engine_flags, options.substitution_flags);
    state.file_name = file_name.clone();
    state.current_line = options.current_line;
    state.set_modes(options.strict, options.syntax);

    let result = logging::with_source_context(file_name.as_deref().unwrap_or("<input>"), || {
        run_parse(&source, start, length, &options, file_name.as_deref(), &mut state)
    });

    match result {
        Ok(()) => {
            println!("{}", render_output(&source, &state, &options)?);
            Ok(())
        }
        Err(error) => {
            print_failure(&source, file_name.as_deref(), options.current_line, &error);
            if options.json {
                println!("{}", serde_json::to_string_pretty(&state.snapshot(&source))?);
            }
            std::process::exit(1);
        }
    }
}

fn run_parse(
    source: &str,
    start: usize,
    length: usize,
    options: &CliOptions,
    file_name: Option<&str>,
    state: &mut ParseState,
) -> Result<(), ParseError> {
    match options.mode {
        Mode::Command => parse_command(source, start, length, options.nested, state, false),
        Mode::Expression => parse_expression(source, start, length, state, options.no_ready),
        Mode::Script | Mode::Complete => {
            let script_options = ScriptOptions {
                file_name,
                current_line: options.current_line,
                engine_flags: options.engine_flags,
                substitution_flags: options.substitution_flags,
                nested: options.nested,
                no_ready: options.no_ready,
                syntax: options.syntax,
                strict: options.strict,
            };
            parse_script(source, start, length, &script_options, state).map(|_| ())
        }
    }
}

fn render_output(
    source: &str,
    state: &ParseState,
    options: &CliOptions,
) -> Result<String, serde_json::Error> {
    if options.json {
        return serde_json::to_string_pretty(&state.snapshot(source));
    }
    if options.round_trip {
        return Ok(dump_tokens(source, &filter_for_round_trip(state.tokens())));
    }
    Ok(state.dump(source))
}

fn print_failure(source: &str, file_name: Option<&str>, first_line: u32, error: &ParseError) {
    let map = SourceMap::with_first_line(source, first_line);
    eprint!(
        "{}",
        map.format_error(file_name, error.offset, &error.enhanced_message())
    );
    eprintln!(
        "  = code {} ({}, {})",
        error.error_code().as_str(),
        error.category(),
        error.severity()
    );
}

/// Validate `-startindex`/`-characters` against the source
fn resolve_window(
    source: &str,
    start: usize,
    characters: Option<usize>,
) -> Result<(usize, usize), String> {
    if start > source.len() || !source.is_char_boundary(start) {
        return Err(format!("start index {} is not inside the input", start));
    }
    let length = characters.unwrap_or(source.len() - start);
    let end = start
        .checked_add(length)
        .filter(|&end| end <= source.len() && source.is_char_boundary(end))
        .ok_or_else(|| format!("{} characters from {} overrun the input", length, start))?;
    Ok((start, end - start))
}

fn parse_args(args: &[String], config: &RuntimeConfig) -> Result<CliOptions, String> {
    let mode = match args.first().map(String::as_str) {
        Some("command") => Mode::Command,
        Some("script") => Mode::Script,
        Some("expression") | Some("expr") => Mode::Expression,
        Some("complete") => Mode::Complete,
        Some(other) => return Err(format!("unknown mode '{}'", other)),
        None => return Err("missing mode".to_string()),
    };

    let mut options = CliOptions {
        mode,
        input: Input::Text(String::new()),
        engine_flags: EngineFlags::from(&config.parser),
        substitution_flags: SubstitutionFlags::all(),
        file_name: None,
        current_line: 1,
        start_index: 0,
        characters: None,
        nested: false,
        syntax: config.parser.syntax,
        strict: config.parser.strict,
        round_trip: false,
        no_ready: false,
        json: false,
        log_file: None,
    };
    let mut text = None;

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-nocomments" => options.engine_flags.allow_comments = false,
            "-novariables" => options.substitution_flags.substitute_variables = false,
            "-nocommands" => options.substitution_flags.substitute_commands = false,
            "-nobackslashes" => options.substitution_flags.substitute_backslashes = false,
            "-nested" => options.nested = true,
            "-syntax" => options.syntax = true,
            "-strict" => options.strict = true,
            "-roundtrip" => options.round_trip = true,
            "-noready" => options.no_ready = true,
            "-json" => options.json = true,
            "-filename" => options.file_name = Some(take_value(args, &mut i)?),
            "-currentline" => options.current_line = parse_number(arg, &take_value(args, &mut i)?)?,
            "-startindex" => options.start_index = parse_number(arg, &take_value(args, &mut i)?)?,
            "-characters" => options.characters = Some(parse_number(arg, &take_value(args, &mut i)?)?),
            "-file" => options.input = Input::File(take_value(args, &mut i)?),
            "-logfile" => options.log_file = Some(PathBuf::from(take_value(args, &mut i)?)),
            "-config" => {
                take_value(args, &mut i)?;
            }
            "--" => {
                text = args.get(i + 1).cloned();
                i = args.len();
                continue;
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("unknown option '{}'", arg))
            }
            _ => {
                if text.is_some() {
                    return Err(format!("unexpected argument '{}'", arg));
                }
                text = Some(arg.to_string());
            }
        }
        i += 1;
    }

    match (&options.input, text) {
        (Input::File(_), Some(_)) => return Err("give either text or -file, not both".to_string()),
        (Input::File(_), None) => {}
        (_, Some(text)) => options.input = Input::Text(text),
        (_, None) => return Err("missing input text".to_string()),
    }

    Ok(options)
}

/// Value of the option at `args[*i]`; advances past it
fn take_value(args: &[String], i: &mut usize) -> Result<String, String> {
    let option = &args[*i];
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", option))
}

fn parse_number<T: std::str::FromStr>(option: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{} expects a number, got '{}'", option, value))
}

fn usage_error(program: &str, message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("Run '{} --help' for usage", program);
    std::process::exit(2);
}

fn print_help(program_name: &str) {
    println!("tclparse v{}", env!("CARGO_PKG_VERSION"));
    println!("Tokenize Tcl-family scripts, commands and expressions");
    println!();
    println!("USAGE:");
    println!(
        "    {} <command|script|expression|complete> [options] (<text> | -file <path>)",
        program_name
    );
    println!();
    println!("OPTIONS:");
    println!("    -nocomments         Treat # as an ordinary character");
    println!("    -novariables        Disable $ substitution");
    println!("    -nocommands         Disable [command] substitution");
    println!("    -nobackslashes      Disable backslash substitution");
    println!("    -filename NAME      Name used in diagnostics");
    println!("    -currentline N      Line number of the first input line");
    println!("    -startindex N       Byte offset where parsing starts");
    println!("    -characters N       Number of bytes to parse");
    println!("    -nested             Stop at the first unmatched ]");
    println!("    -syntax             Tolerate unfinished input and classify words");
    println!("    -strict             Reject characters after a closing brace or quote");
    println!("    -roundtrip          Print only the round-trip tokens");
    println!("    -noready            Skip the token budget check");
    println!("    -json               Print the state as JSON");
    println!("    -logfile PATH       Append log events to PATH");
    println!("    -config PATH        Load runtime preferences from a TOML file");
    println!();
    println!("EXAMPLES:");
    println!("    {} script 'set a [expr {{$b + 1}}]'", program_name);
    println!("    {} expression -json '$x * 2'", program_name);
    println!("    {} script -roundtrip -file init.tcl", program_name);
    println!();
    println!("CONFIGURATION:");
    println!("    {}", tcl_parser::config::build_info::source_info());
}
