// Entry point and high-level CLI flow.
//
// With an input file the binary runs one analysis and exits. Without one it
// opens a menu:
// - [1] loads and cleans a zone file, printing diagnostics,
// - [2] changes the four risk parameters,
// - [3] prints the loss split and exports the table and a JSON summary.
// Parameter changes re-run only the apportionment; the loaded records stay.
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use zone_loss::output::{preview_table_rows, write_csv, write_json};
use zone_loss::util::{format_int, format_volume};
use zone_loss::{
    ingest, LoaderConfig, PipeMaterial, RiskParameters, Upload, ZoneDataset, ZoneLossError,
};

const TABLE_FILE: &str = "zone_losses.csv";
const SUMMARY_FILE: &str = "summary.json";

/// Estimate physical and administrative water loss per distribution zone
#[derive(Debug, Parser)]
#[command(name = "zone-loss", version)]
struct Args {
    /// Zone file (.csv, .xlsx, .xlsm or .xls). Omit to start the interactive menu.
    input: Option<PathBuf>,

    /// Pipe age index, 1 (new) to 5 (25+ years)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pipe_age: u8,

    /// Material quality index 1-5, or a material name (hdpe, concrete, ductile, grey, asbestos)
    #[arg(long, default_value = "asbestos")]
    material: String,

    /// Ground movement / thermal stress index, 1 to 5
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=5))]
    ground_stress: u8,

    /// Pressure profile index, 1 to 5
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pressure: u8,

    /// Directory for the exported table and summary
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Number of zones shown in the console preview
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,

    /// JSON file overriding loader settings (scan window, blank tokens)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log pipeline details
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zone_loss={}", level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}

fn parse_material(raw: &str) -> zone_loss::Result<u8> {
    match raw.trim().parse::<u8>() {
        Ok(index) => Ok(index),
        Err(_) => Ok(raw.parse::<PipeMaterial>()?.quality_index()),
    }
}

/// State of one interactive run. Replaced wholesale on every load.
struct Session {
    config: LoaderConfig,
    params: RiskParameters,
    dataset: Option<ZoneDataset>,
    out_dir: PathBuf,
    preview_rows: usize,
}

/// One trimmed line, or `None` once the input is closed or unreadable.
fn read_answer(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

/// Ask for an index until the user gives 1-5; empty input keeps `current`.
fn prompt_index(label: &str, current: u8) -> u8 {
    loop {
        let Some(answer) = prompt(&format!("{} [1-5, current {}]: ", label, current)) else {
            return current;
        };
        if answer.is_empty() {
            return current;
        }
        match answer.parse::<u8>() {
            Ok(v) if (1..=5).contains(&v) => return v,
            _ => println!("Invalid value. Please enter a number from 1 to 5."),
        }
    }
}

fn prompt_material(current: u8) -> u8 {
    println!("Dominant pipe material:");
    for (i, m) in PipeMaterial::ALL.iter().enumerate() {
        println!("  [{}] {} (index {})", i + 1, m, m.quality_index());
    }
    loop {
        let Some(answer) = prompt(&format!("Material [1-5, current index {}]: ", current)) else {
            return current;
        };
        if answer.is_empty() {
            return current;
        }
        match answer.parse::<usize>() {
            Ok(i) if (1..=PipeMaterial::ALL.len()).contains(&i) => {
                return PipeMaterial::ALL[i - 1].quality_index()
            }
            _ => println!("Invalid choice."),
        }
    }
}

fn load_file(path: &Path, config: &LoaderConfig) -> zone_loss::Result<ZoneDataset> {
    let upload = Upload::from_path(path)?;
    ingest(&upload, config)
}

fn print_load_summary(dataset: &ZoneDataset) {
    let header_note = if dataset.header.matched { "detected" } else { "fallback" };
    println!(
        "Header row: {} ({})",
        dataset.header.index + 1,
        header_note
    );
    println!("Columns: {}", dataset.table.labels.join(" | "));
    for b in dataset.roles.bindings() {
        println!("  {} <- {}", b.role, b.label);
    }
    let r = &dataset.report;
    println!(
        "Processing dataset... ({} rows read, {} zone records kept)",
        format_int(r.data_rows),
        format_int(r.kept)
    );
    let skipped = r.missing_zone_name + r.aggregate_rows + r.non_numeric_volume;
    if skipped > 0 {
        println!(
            "Note: {} rows skipped ({} without zone name, {} total rows, {} non-numeric volumes).",
            format_int(skipped),
            format_int(r.missing_zone_name),
            format_int(r.aggregate_rows),
            format_int(r.non_numeric_volume)
        );
    }
    println!();
}

fn print_error(e: &ZoneLossError) {
    eprintln!("Error: {}", e);
    if let ZoneLossError::ColumnRoleMissing { table, .. } = e {
        eprintln!("Columns found: {}", table.labels.join(" | "));
        eprintln!("The file must contain columns like:");
        eprintln!("- KARNE NO VE ADI (zone name)");
        eprintln!("- VERİLEN SU MİKTARI M3 (supplied volume)");
        eprintln!("- TAHAKKUK M3 (billed volume)");
    }
    eprintln!();
}

fn run_report(
    dataset: &ZoneDataset,
    params: &RiskParameters,
    out_dir: &Path,
    preview_rows: usize,
) -> zone_loss::Result<()> {
    let report = dataset.evaluate(params)?;

    println!("Loss Split by Zone");
    println!("(Source: {})\n", dataset.source);
    println!("Risk score: {} / 20", report.risk_score());
    println!("Physical (pipe) loss share: {:.1}%", report.leak_percent_display());
    println!(
        "Administrative (meter/billing) loss share: {:.1}%\n",
        report.administrative_percent_display()
    );

    let rows = report.display_rows();
    preview_table_rows(&rows, preview_rows);

    let totals = report.totals();
    println!(
        "Total loss: {} m³ of {} m³ supplied",
        format_volume(totals.total_loss_m3),
        format_volume(totals.supplied_m3)
    );
    for line in report.action_plan() {
        println!("{}", line);
    }
    println!();

    std::fs::create_dir_all(out_dir)?;
    let table_path = out_dir.join(TABLE_FILE);
    write_csv(&table_path, &rows)?;
    let summary_path = out_dir.join(SUMMARY_FILE);
    write_json(&summary_path, &report.summary(&dataset.source))?;
    info!("Exported {} and {}", table_path.display(), summary_path.display());
    println!(
        "(Full table exported to {}, summary to {})\n",
        table_path.display(),
        summary_path.display()
    );
    Ok(())
}

fn run_interactive(mut session: Session) {
    loop {
        println!("Zone Loss Analysis");
        println!("[1] Load zone file");
        println!("[2] Set risk parameters");
        println!("[3] Generate report");
        println!("[4] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            println!("\nEnd of input. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => {
                let Some(path) = prompt("Path to zone file (.csv/.xlsx): ") else {
                    break;
                };
                // A failed load discards the previous file too.
                session.dataset = None;
                match load_file(Path::new(&path), &session.config) {
                    Ok(dataset) => {
                        print_load_summary(&dataset);
                        session.dataset = Some(dataset);
                    }
                    Err(e) => print_error(&e),
                }
            }
            "2" => {
                let p = session.params;
                session.params = RiskParameters::clamped(
                    prompt_index("Pipe age index", p.pipe_age()),
                    prompt_material(p.material()),
                    prompt_index("Ground movement / thermal stress", p.ground_stress()),
                    prompt_index("Pressure profile", p.pressure()),
                );
                println!(
                    "Risk score is now {} (physical share {:.1}%)\n",
                    session.params.risk_score(),
                    session.params.leak_fraction() * 100.0
                );
            }
            "3" => {
                let Some(dataset) = session.dataset.as_ref() else {
                    println!("Error: No data loaded. Please load a zone file first (option 1).\n");
                    continue;
                };
                if let Err(e) =
                    run_report(dataset, &session.params, &session.out_dir, session.preview_rows)
                {
                    print_error(&e);
                }
            }
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 4.\n"),
        }
    }
}

fn run(args: Args) -> zone_loss::Result<()> {
    let config = match &args.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::default(),
    };
    let params = RiskParameters::new(
        args.pipe_age,
        parse_material(&args.material)?,
        args.ground_stress,
        args.pressure,
    )?;

    let Some(input) = args.input.as_deref() else {
        run_interactive(Session {
            config,
            params,
            dataset: None,
            out_dir: args.out_dir,
            preview_rows: args.preview_rows,
        });
        return Ok(());
    };

    let dataset = load_file(input, &config)?;
    print_load_summary(&dataset);
    run_report(&dataset, &params, &args.out_dir, args.preview_rows)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        print_error(&e);
        process::exit(1);
    }
}
