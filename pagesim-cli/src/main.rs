mod commands;
mod dump;

use std::io::Read;

use clap::Parser;
use pagesim::{MemoryError, SegmentLayout, SimulatedMemory};

use commands::Command;

/// Drives a simulated virtual memory from a command script
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Program image laid out as the text bytes followed by the data bytes
    #[clap(long, value_parser)]
    image: String,

    /// Swap file to create, sized to the swappable segments
    #[clap(long, value_parser)]
    swap: String,

    /// Byte size of the text segment
    #[clap(long, value_parser)]
    text_size: usize,

    /// Byte size of the data segment
    #[clap(long, value_parser)]
    data_size: usize,

    /// Byte size of the bss segment
    #[clap(long, value_parser)]
    bss_size: usize,

    /// Byte size of the heap/stack segment
    #[clap(long, value_parser)]
    heap_stack_size: usize,

    /// Bytes per page; a power of two dividing every segment size
    #[clap(long, value_parser, default_value_t = 8)]
    page_size: usize,

    /// Command script; read from stdin when omitted
    #[clap(short, long, value_parser)]
    script: Option<String>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let layout = SegmentLayout {
        text_size: args.text_size,
        data_size: args.data_size,
        bss_size: args.bss_size,
        heap_stack_size: args.heap_stack_size,
        page_size: args.page_size,
    };

    let mut sim = match SimulatedMemory::new(&args.image, &args.swap, layout) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("unable to set up the simulator - {e}");
            std::process::exit(1);
        }
    };

    let script = match read_script(args.script.as_deref()) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("unable to read the command script - {e}");
            std::process::exit(1);
        }
    };

    for (num, line) in script.lines().enumerate() {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("line {} - {e}", num + 1);
                std::process::exit(1);
            }
        };

        // Access errors are reported and execution continues.
        if let Err(e) = run(&mut sim, command) {
            println!("ERR - {e}");
        }
    }
}

fn run(sim: &mut SimulatedMemory, command: Command) -> Result<(), MemoryError> {
    let mut out = std::io::stdout();

    match command {
        Command::Load(address) => {
            let value = sim.load(address)?;
            println!("{address} -> [{}] ({value})", dump::render(value));
        }
        Command::Store(address, value) => sim.store(address, value)?,
        Command::DumpMemory => dump::memory(sim, &mut out)?,
        Command::DumpSwap => dump::swap(sim, &mut out)?,
        Command::DumpTable => dump::page_table(sim, &mut out)?,
    }

    Ok(())
}

fn read_script(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
