//! ulog -- exercise the per-core event log and print a snapshot
//!
//! Spawns one worker thread per core, has each record a burst of events,
//! then retrieves a snapshot through the query boundary (or the streaming
//! device with `--device`) and prints it the way the kernel log viewer does.
//!
//! Usage:
//!   ulog [--cores <n>] [--per-core <n>] [--max <n>] [--level <mask>] [--device]

use std::{env, process, thread};

use veridian_klog::{
    config::{DEVICE_READ_ENTRIES, MAX_QUERY_ENTRIES},
    device::dev_read,
    query::sys_getklog,
    worker::{self, ThreadWorker},
    Arg, EntryView, KlogConfig, KlogDevice, KlogEngine, KlogEntry, Severity, SeverityMask,
    RECORD_SIZE,
};

const DEFAULT_PER_CORE: usize = 8;
const DEFAULT_MAX: i32 = 64;

struct Options {
    cores: usize,
    per_core: usize,
    max: i32,
    mask: SeverityMask,
    device: bool,
}

fn print_usage() {
    eprintln!("Usage: ulog [--cores <n>] [--per-core <n>] [--max <n>] [--level <mask>] [--device]");
    eprintln!();
    eprintln!("  --cores <n>      worker cores (default: host parallelism)");
    eprintln!("  --per-core <n>   events recorded by each core (default: {})", DEFAULT_PER_CORE);
    eprintln!("  --max <n>        entries to request (default: {})", DEFAULT_MAX);
    eprintln!("  --level <mask>   all | warn+ | debug,error,... (default: all)");
    eprintln!("  --device         read through the streaming device");
}

fn fail(msg: &str) -> ! {
    eprintln!("ulog: {}", msg);
    print_usage();
    process::exit(1);
}

fn parse_options() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options {
        cores: KlogConfig::from_host().cores,
        per_core: DEFAULT_PER_CORE,
        max: DEFAULT_MAX,
        mask: SeverityMask::all(),
        device: false,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let needs_value = !matches!(flag, "--device" | "-d" | "--help" | "-h");
        let value = if needs_value {
            i += 1;
            args.get(i).map(String::as_str).unwrap_or_else(|| fail("missing option value"))
        } else {
            ""
        };
        match flag {
            "--cores" | "-c" => {
                opts.cores = value.parse().unwrap_or_else(|_| fail("invalid core count"));
            }
            "--per-core" | "-n" => {
                opts.per_core = value.parse().unwrap_or_else(|_| fail("invalid event count"));
            }
            "--max" | "-m" => {
                opts.max = value.parse().unwrap_or_else(|_| fail("invalid entry count"));
            }
            "--level" | "-l" => {
                opts.mask =
                    SeverityMask::parse(value).unwrap_or_else(|| fail("invalid severity mask"));
            }
            "--device" | "-d" => opts.device = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => fail(&format!("unknown option: {}", other)),
        }
        i += 1;
    }
    opts
}

/// Synthetic subject for event `i` of `core`. Wraps instead of overflowing.
fn subject_id(core: usize, i: usize) -> u32 {
    (core as u32)
        .wrapping_mul(100)
        .wrapping_add(i as u32)
        .wrapping_add(1)
}

/// Each worker binds itself to its core and records a mix of severities.
fn run_workers(engine: &KlogEngine, cores: usize, per_core: usize) {
    thread::scope(|s| {
        for core in 0..cores {
            s.spawn(move || {
                worker::bind_current_thread(core);
                for i in 0..per_core {
                    worker::set_subject(subject_id(core, i));
                    let severity = match i % 4 {
                        0 => Severity::Debug,
                        1 => Severity::Info,
                        2 => Severity::Warn,
                        _ => Severity::Error,
                    };
                    engine.record(
                        &ThreadWorker,
                        severity,
                        "worker %d event %d tag %x",
                        &[Arg::Int(core as i32), Arg::Int(i as i32), Arg::Hex(i as u32)],
                    );
                }
            });
        }
    });
}

fn fetch(engine: &KlogEngine, opts: &Options) -> Result<Vec<KlogEntry>, &'static str> {
    if opts.device {
        let dev = KlogDevice::new(engine);
        let mut buf = vec![0u8; DEVICE_READ_ENTRIES * RECORD_SIZE];
        let n = dev_read(&dev, 0, &mut buf);
        if n < 0 {
            return Err("klog device read failed");
        }
        return Ok(KlogEntry::decode_all(&buf[..n as usize]).collect());
    }

    let region = opts.max.clamp(0, MAX_QUERY_ENTRIES as i32) as usize;
    let mut mem = vec![0u8; region * RECORD_SIZE];
    let count = sys_getklog(engine, &mut mem, 0, opts.max);
    if count < 0 {
        return Err("getklog failed");
    }
    Ok(KlogEntry::decode_all(&mem[..count as usize * RECORD_SIZE]).collect())
}

/// Entries the mask admits. The header counts these, not the snapshot.
fn visible(entries: &[KlogEntry], mask: SeverityMask) -> Vec<&KlogEntry> {
    entries.iter().filter(|e| mask.admits(e)).collect()
}

fn main() {
    let opts = parse_options();

    let engine = match KlogEngine::new(KlogConfig::new(opts.cores)) {
        Ok(engine) => engine,
        Err(err) => fail(&err.to_string()),
    };

    run_workers(&engine, opts.cores, opts.per_core);

    let entries = match fetch(&engine, &opts) {
        Ok(entries) => entries,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    };

    let shown = visible(&entries, opts.mask);
    println!("Kernel Log ({} entries):", shown.len());
    println!("----------------------------------------");
    for entry in shown {
        println!("{}", EntryView(entry));
    }

    let dropped = engine.dropped();
    if dropped > 0 {
        println!("({} entries overwritten before being read)", dropped);
    }
}
