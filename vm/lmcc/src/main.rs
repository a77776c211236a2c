//! Lambda-Chase CLI
//!
//! Assembles, inspects and runs chase programs on the bounded machine.

use lmcc::commands::{check_files, dis_file, exec_file, run_game, ExecOptions, RunOptions};

fn main() {
    lmcc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            let mut options = RunOptions::default();
            let mut files: Vec<String> = Vec::new();

            for arg in args.iter().skip(2) {
                if let Some(value) = arg.strip_prefix("--max-ticks=") {
                    let Ok(ticks) = value.parse() else {
                        eprintln!("error: --max-ticks expects an integer, got '{value}'");
                        std::process::exit(1);
                    };
                    options.max_ticks = Some(ticks);
                } else if arg.starts_with('-') {
                    eprintln!("error: unknown run option '{arg}'");
                    std::process::exit(1);
                } else {
                    files.push(arg.clone());
                }
            }

            if files.len() < 2 {
                eprintln!("Usage: lmc run <map> <lambda.gcc> [ghost.gcc ...] [--max-ticks=N]");
                eprintln!();
                eprintln!("Without a ghost listing, ghosts use a built-in patrol program.");
                std::process::exit(1);
            }
            run_game(&files[0], &files[1], &files[2..], &options);
        }
        "exec" => {
            let mut options = ExecOptions::default();
            let mut path: Option<&str> = None;
            let mut call_args: Vec<i32> = Vec::new();

            for arg in args.iter().skip(2) {
                if let Some(value) = arg.strip_prefix("--entry=") {
                    let Ok(entry) = value.parse() else {
                        eprintln!("error: --entry expects an address, got '{value}'");
                        std::process::exit(1);
                    };
                    options.entry = entry;
                } else if let Some(value) = arg.strip_prefix("--budget=") {
                    let Ok(budget) = value.parse() else {
                        eprintln!("error: --budget expects an integer, got '{value}'");
                        std::process::exit(1);
                    };
                    options.budget = Some(budget);
                } else if arg == "--trace" {
                    options.trace = true;
                } else if path.is_none() {
                    path = Some(arg.as_str());
                } else {
                    let Ok(value) = arg.parse() else {
                        eprintln!("error: call arguments must be integers, got '{arg}'");
                        std::process::exit(1);
                    };
                    call_args.push(value);
                }
            }

            let Some(path) = path else {
                eprintln!("Usage: lmc exec <prog.gcc> [int ...] [--entry=A] [--budget=N] [--trace]");
                std::process::exit(1);
            };
            exec_file(path, &call_args, &options);
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: lmc check <prog.gcc> [...]");
                std::process::exit(1);
            }
            check_files(&args[2..]);
        }
        "dis" => {
            if args.len() < 3 {
                eprintln!("Usage: lmc dis <prog.gcc>");
                std::process::exit(1);
            }
            dis_file(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Lambda-Chase {}", env!("CARGO_PKG_VERSION"));
            println!("Bounded stack machine for scripted maze agents");
        }
        _ => {
            // If it looks like a listing, execute it directly
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gcc"))
            {
                exec_file(command, &[], &ExecOptions::default());
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Lambda-Chase virtual machine");
    println!();
    println!("Usage: lmc <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <map> <lambda.gcc> [ghost.gcc ...]  Play a chase on a map");
    println!("  exec <prog.gcc> [int ...]               Call a program's entry closure");
    println!("  check <prog.gcc> [...]                  Load listings, report errors");
    println!("  dis <prog.gcc>                          Print the numbered listing");
    println!("  help                                    Show this help message");
    println!("  version                                 Show version information");
    println!();
    println!("Run options:");
    println!("  --max-ticks=N     End the game after at most N ticks");
    println!();
    println!("Exec options:");
    println!("  --entry=A         Call the closure at address A (default: 0)");
    println!("  --budget=N        Instruction budget for the call (default: 3072000)");
    println!("  --trace           Buffer DEBUG output, print it with addresses");
    println!();
    println!("Examples:");
    println!("  lmc run demos/classic.map demos/spinner.gcc");
    println!("  lmc run demos/classic.map demos/spinner.gcc demos/compass.gcc");
    println!("  lmc exec demos/minimal.gcc 0 0");
    println!("  lmc exec demos/minimal.gcc --entry=4 --trace");
    println!("  lmc check demos/*.gcc");
    println!("  lmc dis demos/compass.gcc");
}
