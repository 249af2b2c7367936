//! RV32 `virt`-machine emulator CLI.
//!
//! Host-side front-end for the emulator core: loads the kernel and disk
//! images from files, bridges the UART to this terminal, and steps the
//! machine until it halts. Terminal input is captured on a background thread
//! so the run loop never blocks; bytes are handed to the core strictly
//! between `step()` calls, per the core's contract.

use std::io::{self, Read, Write};
use std::sync::mpsc::{channel, Receiver};
use std::{fs, process, thread};

use clap::Parser;

use rv32virt_core::{Config, Emulator};

#[derive(Parser, Debug)]
#[command(
    name = "rv32virt",
    version,
    about = "RISC-V RV32 virt-machine emulator",
    long_about = "Boot a kernel image on the emulated virt machine.\n\nExamples:\n  rv32virt --kernel xv6/kernel.bin --disk xv6/fs.img\n  RUST_LOG=rv32virt_core=debug rv32virt --kernel kernel.bin"
)]
struct Cli {
    /// Kernel image, loaded flat at the bottom of DRAM.
    #[arg(short, long)]
    kernel: String,

    /// Disk image backing the virtio block device.
    #[arg(short, long)]
    disk: Option<String>,

    /// JSON configuration file (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error reading config {path}: {err}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let kernel = read_image(&cli.kernel);
    let disk = cli.disk.as_deref().map_or_else(Vec::new, read_image);

    let mut emu = Emulator::new(&kernel, disk, &config);
    let stdin_rx = spawn_stdin_reader();

    loop {
        while let Ok(byte) = stdin_rx.try_recv() {
            emu.push_input(byte);
        }

        if let Err(trap) = emu.step() {
            flush_output(&mut emu);
            eprintln!("\n[!] FATAL TRAP: {trap} at pc {:#010x}", emu.cpu.pc);
            process::exit(1);
        }

        flush_output(&mut emu);
    }
}

/// Parses a JSON config file.
fn load_config(path: &str) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Reads an image file or exits with a message.
fn read_image(path: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Error reading image {path}: {err}");
            process::exit(1);
        }
    }
}

/// Spawns the stdin capture thread; the channel closes when stdin does.
fn spawn_stdin_reader() -> Receiver<u8> {
    let (tx, rx) = channel();
    let _ = thread::spawn(move || {
        let mut buffer = [0u8; 1];
        let stdin = io::stdin();
        let mut handle = stdin.lock();
        while handle.read_exact(&mut buffer).is_ok() {
            if tx.send(buffer[0]).is_err() {
                break;
            }
        }
    });
    rx
}

/// Drains pending UART output to stdout.
fn flush_output(emu: &mut Emulator) {
    let mut wrote = false;
    let mut stdout = io::stdout().lock();
    while let Some(byte) = emu.take_output() {
        let _ = stdout.write_all(&[byte]);
        wrote = true;
    }
    if wrote {
        let _ = stdout.flush();
    }
}
