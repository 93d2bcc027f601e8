use clap::Parser;
use mymake::interpreter::signals;
use mymake::make::{Make, MakeOptions, DEFAULT_MAKEFILE};

#[derive(Parser)]
#[command(name = "mymake")]
#[command(about = "A minimal make-style build engine")]
#[command(version)]
struct Cli {
    /// Makefile to read rules from
    #[arg(short = 'f', value_name = "PATH", default_value = DEFAULT_MAKEFILE)]
    makefile: String,

    /// Print parsed variables and rules, skip execution
    #[arg(short = 'p')]
    print_database: bool,

    /// Continue with remaining targets after a recipe fails
    #[arg(short = 'k')]
    keep_going: bool,

    /// Emit indented per-target trace lines
    #[arg(short = 'd')]
    trace: bool,

    /// Mask the user interrupt on the driver process
    #[arg(short = 'i')]
    block_interrupt: bool,

    /// Abort the whole build after SECS wall-clock seconds
    #[arg(short = 't', value_name = "SECS")]
    timeout: Option<u32>,

    /// Target to build (defaults to the first rule)
    #[arg()]
    target: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let options = MakeOptions {
        makefile: cli.makefile,
        print_database: cli.print_database,
        keep_going: cli.keep_going,
        trace: cli.trace,
        block_interrupt: cli.block_interrupt,
        timeout: cli.timeout,
    };

    let mut make = match Make::new(options) {
        Ok(make) => make,
        Err(err) => {
            eprintln!("mymake: {}", err);
            std::process::exit(1);
        }
    };

    let target = cli.target.unwrap_or_else(|| make.default_target());

    if let Err(err) = signals::install(make.options().block_interrupt, make.options().timeout) {
        eprintln!("mymake: cannot install signal handlers: {}", err);
        std::process::exit(1);
    }

    if make.options().trace {
        make.print_debug_stats(&target);
    }

    if make.options().print_database {
        make.print_database();
    } else {
        make.build(&target);
    }
}
