use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs, process};

use readzip::{ChromosomeCodes, Method, OutputType, Reference};
use readzip::{methods, utils};

use getopts::Options;

use log::{info, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();
    env_logger::Builder::new().filter_level(config.log_level).init();

    // Check that the outputs do not exist.
    for output in config.outputs.iter() {
        if utils::file_exists(output) {
            if config.overwrite {
                info!("Overwriting {}", output.display());
                fs::remove_file(output).map_err(|x| x.to_string())?;
            } else {
                return Err(format!("Output file {} already exists", output.display()));
            }
        }
    }

    // Load the reference.
    let reference_size = utils::file_size(&config.reference).unwrap_or(String::from("unknown"));
    eprintln!("Loading reference {} ({})", config.reference.display(), reference_size);
    let reference = Reference::load(&config.reference).map_err(|x| x.to_string())?;
    let codes = ChromosomeCodes::new(&reference);
    info!("{} reference sequences, {}-bit chromosome codes", codes.len(), codes.width());

    match config.mode {
        Mode::Compress => {
            let count = methods::compress_files(config.method, &config.inputs, &config.outputs[0], &codes)
                .map_err(|x| x.to_string())?;
            let unit = if config.method.is_paired() { "pairs" } else { "reads" };
            eprintln!("Compressed {} {} with method {}", count, unit, config.method);
            report_sizes(&config.inputs, &config.outputs);
        },
        Mode::Extract => {
            let count = methods::decompress_files(
                config.method, &config.inputs[0], &config.outputs, &reference, &codes, config.output_type
            ).map_err(|x| x.to_string())?;
            let unit = if config.method.is_paired() { "pairs" } else { "reads" };
            eprintln!("Extracted {} {} with method {}", count, unit, config.method);
            report_sizes(&config.inputs, &config.outputs);
        },
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

fn total_size(files: &[PathBuf]) -> Option<usize> {
    files.iter().map(utils::file_len).sum()
}

fn report_sizes(inputs: &[PathBuf], outputs: &[PathBuf]) {
    let input_size = total_size(inputs);
    let output_size = total_size(outputs);
    let show = |size: Option<usize>| size.map_or(String::from("unknown"), utils::human_readable_size);
    eprintln!("Input size: {}, output size: {}", show(input_size), show(output_size));
    if let (Some(input), Some(output)) = (input_size, output_size) {
        if input > 0 && output > 0 {
            let (larger, smaller) = if input >= output { (input, output) } else { (output, input) };
            eprintln!("Ratio: {:.3}", larger as f64 / smaller as f64);
        }
    }
}

//-----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Compress,
    Extract,
}

struct Config {
    pub mode: Mode,
    pub method: Method,
    pub reference: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub output_type: OutputType,
    pub overwrite: bool,
    pub log_level: LevelFilter,
}

fn with_extension(filename: &Path, extension: &str) -> PathBuf {
    let mut name = filename.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

impl Config {
    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!(
            "Usage: {} [options] -r reference.fa input [input2]\n\n\
            Compresses alignments (one input for methods A and B, two for C and D)\n\
            or extracts reads from a compressed file.",
            program
        );

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optflag("z", "compress", "compress alignments (default)");
        opts.optflag("x", "extract", "extract reads from a compressed file");
        opts.optflag("a", "", "method A: single-end reads in input order (default)");
        opts.optflag("b", "", "method B: single-end reads sorted by position");
        opts.optflag("c", "", "method C: paired-end reads in input order");
        opts.optflag("d", "", "method D: paired-end reads sorted by position");
        opts.optopt("m", "method", "compression method (a, b, c, or d)", "STR");
        opts.optopt("r", "reference", "reference sequences in FASTA format (required)", "FILE");
        opts.optopt("o", "output", "output file name (default: <input>.rz or <input>.fa)", "FILE");
        opts.optopt("O", "output2", "second mate output file name (default: <input>.2.fa)", "FILE");
        opts.optflag("l", "alignments", "extract decoded alignments instead of reads");
        opts.optflag("", "overwrite", "overwrite the output files if they exist");
        opts.optflagmulti("v", "verbose", "increase verbosity (-v info, -vv debug)");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        if matches.opt_present("z") && matches.opt_present("x") {
            eprintln!("Options -z and -x are mutually exclusive");
            process::exit(1);
        }
        let mode = if matches.opt_present("x") { Mode::Extract } else { Mode::Compress };

        let mut chosen: Vec<Method> = Vec::new();
        for (flag, method) in [("a", Method::A), ("b", Method::B), ("c", Method::C), ("d", Method::D)] {
            if matches.opt_present(flag) {
                chosen.push(method);
            }
        }
        if let Some(s) = matches.opt_str("m") {
            match Method::from_name(&s) {
                Some(method) => chosen.push(method),
                None => {
                    eprintln!("Invalid method: {}", s);
                    process::exit(1);
                }
            }
        }
        chosen.dedup();
        if chosen.len() > 1 {
            eprintln!("Only one compression method can be used");
            process::exit(1);
        }
        let method = chosen.first().copied().unwrap_or(Method::A);

        let reference = if let Some(s) = matches.opt_str("r") {
            PathBuf::from(s)
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let inputs: Vec<PathBuf> = matches.free.iter().map(PathBuf::from).collect();
        let expected_inputs = if mode == Mode::Compress { method.files() } else { 1 };
        if inputs.len() != expected_inputs {
            eprintln!("Expected {} input file(s) for method {}, got {}", expected_inputs, method, inputs.len());
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }

        let outputs = match mode {
            Mode::Compress => {
                if matches.opt_present("O") {
                    eprintln!("Option -O is only used when extracting");
                    process::exit(1);
                }
                vec![matches.opt_str("o").map_or_else(|| with_extension(&inputs[0], "rz"), PathBuf::from)]
            },
            Mode::Extract if method.is_paired() => {
                vec![
                    matches.opt_str("o").map_or_else(|| with_extension(&inputs[0], "1.fa"), PathBuf::from),
                    matches.opt_str("O").map_or_else(|| with_extension(&inputs[0], "2.fa"), PathBuf::from),
                ]
            },
            Mode::Extract => {
                if matches.opt_present("O") {
                    eprintln!("Option -O is only used with paired-end methods");
                    process::exit(1);
                }
                vec![matches.opt_str("o").map_or_else(|| with_extension(&inputs[0], "fa"), PathBuf::from)]
            },
        };

        let output_type = if matches.opt_present("l") { OutputType::Alignments } else { OutputType::Reads };
        if output_type == OutputType::Alignments && mode == Mode::Compress {
            eprintln!("Option -l is only used when extracting");
            process::exit(1);
        }

        let log_level = match matches.opt_count("v") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };

        Config {
            mode,
            method,
            reference,
            inputs,
            outputs,
            output_type,
            overwrite: matches.opt_present("overwrite"),
            log_level,
        }
    }
}

//-----------------------------------------------------------------------------
