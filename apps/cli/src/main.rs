use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use spd_core::crc;
use spd_core::edit::FieldValues;
use spd_core::session::SpdSession;
use spd_core::{DecodeOutput, ForcedMemoryType};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "SPD dump decoder and editor", long_about = None)]
struct Args {
    /// Path to the SPD dump file (256-1024 bytes)
    dump: String,

    /// Force the memory generation for corrupted dumps
    #[arg(long, value_enum, default_value_t = ForceArg::Auto)]
    force: ForceArg,

    /// Repair stored checksums and write the result back
    #[arg(long)]
    fix_crc: bool,

    /// Apply a field edit (repeatable), e.g. --set TimingTckMtb=6
    #[arg(long = "set", value_name = "ID=VALUE")]
    sets: Vec<String>,

    /// Output path for a modified dump (defaults to in-place)
    #[arg(long)]
    out: Option<String>,

    /// Load lookup databases (register models, DRAM part numbers) from TOML
    #[arg(long)]
    databases: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ForceArg {
    Auto,
    Ddr4,
    Ddr5,
}

impl From<ForceArg> for ForcedMemoryType {
    fn from(value: ForceArg) -> Self {
        match value {
            ForceArg::Auto => ForcedMemoryType::Auto,
            ForceArg::Ddr4 => ForcedMemoryType::Ddr4,
            ForceArg::Ddr5 => ForcedMemoryType::Ddr5,
        }
    }
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::WARN.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.databases {
        let db = spd_core::databases::LookupDatabases::load_from_file(path)?;
        if !spd_core::databases::install(db) {
            info!("databases already initialized, --databases ignored");
        }
    }

    let mut session = SpdSession::new();
    session.force_memory_type(args.force.into());
    let memory_type = session.load_file(&args.dump)?;
    info!(memory_type = %memory_type, "Dump loaded");

    let mut dirty = false;

    if !args.sets.is_empty() {
        let mut values = FieldValues::new();
        for entry in &args.sets {
            let (id, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("--set expects ID=VALUE, got '{entry}'"))?;
            values.insert(id.to_string(), value.to_string());
        }

        let errors = session.validate(&values);
        if !errors.is_empty() {
            for (id, message) in &errors {
                error!(field = %id, "{message}");
            }
            return Err(anyhow!("{} field(s) failed validation", errors.len()));
        }

        let changes = session.apply(&values);
        for change in &changes {
            info!(offset = change.offset, len = change.bytes.len(), "patched");
        }
        println!("Applied {} byte change(s).", changes.len());
        dirty = !changes.is_empty();
    }

    if args.fix_crc {
        let Some(buffer) = session.buffer() else {
            return Err(anyhow!("no dump loaded"));
        };
        let mut data = buffer.to_vec();
        let blocks = crc::layout_for(session.memory_type());
        if crc::fix(&mut data, blocks) {
            println!("Checksums repaired.");
            session.load_bytes(data);
            dirty = true;
        } else {
            println!("Checksums already correct.");
        }
    }

    let output = session
        .decode()
        .ok_or_else(|| anyhow!("unsupported or undetectable dump (use --force)"))?;
    print_output(&output);

    if dirty {
        let path = args.out.as_deref().unwrap_or(&args.dump);
        std::fs::write(path, session.buffer().unwrap_or_default())?;
        println!("Wrote {path}.");
    }

    Ok(())
}

fn print_output(output: &DecodeOutput) {
    println!("== Memory Module ==");
    for attr in &output.module {
        println!("  {:<28} {}", attr.label, attr.value);
    }

    println!("\n== DRAM Components ==");
    for attr in &output.dram {
        println!("  {:<28} {}", attr.label, attr.value);
    }

    println!("\n== Timings ==");
    println!(
        "  {:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "Frequency", "CL", "RCD", "RP", "RAS", "RC", "FAW", "RRDS", "RRDL", "WR", "WTRS"
    );
    for row in &output.timings {
        println!(
            "  {:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            row.frequency,
            row.cas,
            row.rcd,
            row.rp,
            row.ras,
            row.rc,
            row.faw,
            row.rrd_s,
            row.rrd_l,
            row.wr,
            row.wtr_s
        );
    }
}
