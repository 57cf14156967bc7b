use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use navmux_core::discovery::{self, Identification};
use navmux_core::nmea::{self, ThsMode};
use navmux_core::{
    CaptureFile, DEFAULT_BAUD_RATE, DeviceRole, NavigationState, RoleTable, SerialSource, Session,
    SessionSummary,
};

const DEFAULT_UDP_TARGET: &str = "224.1.1.1:5007";
const DEFAULT_LOG_FILTER: &str = "navmux=info,navmux_core=info";
const QUIET_LOG_FILTER: &str = "navmux=warn,navmux_core=warn";

#[derive(Parser, Debug)]
#[command(name = "navmux")]
#[command(version)]
#[command(
    about = "Demultiplex a u-blox receiver stream (UBX / NMEA / AIS / RTCM3) and publish heading.",
    long_about = None,
    after_help = "Examples:\n  navmux run --port /dev/ttyACM0\n  navmux run --role heading --roles roles.json\n  navmux replay ubx-20240305T070809Z.ubx -o summary.json\n  navmux identify --port /dev/ttyACM0 --roles roles.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a live receiver and publish HDT/THS sentences over UDP.
    Run(RunArgs),
    /// Decode a recorded byte stream and write a JSON session summary.
    #[command(
        after_help = "Examples:\n  navmux replay capture.ubx -o summary.json\n  navmux replay 'logs/ubx-*.ubx' --stdout --pretty"
    )]
    Replay(ReplayArgs),
    /// List serial ports that look like u-blox receivers.
    Ports,
    /// Poll a receiver for its SEC-UNIQID and report its role.
    Identify(IdentifyArgs),
}

#[derive(Args, Debug)]
struct SerialArgs {
    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Per-read timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Device-role table (JSON object: unique id -> role)
    #[arg(long)]
    roles: Option<PathBuf>,
}

impl SerialArgs {
    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Serial port to read (e.g. /dev/ttyACM0, COM3)
    #[arg(long, required_unless_present = "role", conflicts_with = "role")]
    port: Option<String>,

    /// Locate the receiver by role instead of port (moving_base, heading, roll)
    #[arg(long)]
    role: Option<DeviceRole>,

    #[command(flatten)]
    serial: SerialArgs,

    /// Directory for the raw UBX capture file
    #[arg(long, conflicts_with = "no_capture")]
    capture_dir: Option<PathBuf>,

    /// Do not archive UBX frames
    #[arg(long)]
    no_capture: bool,

    /// UDP destination for heading sentences
    #[arg(long, default_value = DEFAULT_UDP_TARGET)]
    udp: SocketAddr,

    /// Two-letter NMEA talker id for outbound sentences
    #[arg(long, default_value = nmea::DEFAULT_TALKER)]
    talker: String,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Capture file (or glob pattern matching exactly one file)
    input: PathBuf,

    /// Output summary path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON summary to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct IdentifyArgs {
    /// Serial port to poll
    #[arg(long)]
    port: String,

    #[command(flatten)]
    serial: SerialArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = match &cli.command {
        Commands::Run(args) => args.quiet,
        Commands::Replay(args) => args.quiet,
        Commands::Ports | Commands::Identify(_) => false,
    };
    init_logging(quiet);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Replay(args) => cmd_replay(args),
        Commands::Ports => cmd_ports(),
        Commands::Identify(args) => cmd_identify(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new(QUIET_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let timeout = args.serial.timeout();
    let roles = load_roles(args.serial.roles.as_deref())?;
    let port = match (args.port, args.role) {
        (Some(port), _) => port,
        (None, Some(role)) => locate_role(role, &roles, &args.serial)?.port,
        (None, None) => {
            return Err(CliError::new(
                "no receiver selected",
                Some("use --port or --role".to_string()),
            ));
        }
    };
    if args.talker.len() != 2 || !args.talker.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(CliError::new(
            format!("invalid talker id '{}'", args.talker),
            Some("use two uppercase letters, e.g. HE or GP".to_string()),
        ));
    }

    let mut source = SerialSource::open(&port, args.serial.baud, timeout)
        .with_context(|| format!("Failed to open serial port: {port}"))?;
    let socket = UdpSocket::bind(("0.0.0.0", 0)).context("Failed to bind UDP socket")?;
    if args.udp.ip().is_multicast() {
        socket
            .set_multicast_ttl_v4(2)
            .context("Failed to set multicast TTL")?;
    }

    let mut session = Session::new(NavigationState::new()).with_timeout(timeout);
    if !args.no_capture {
        let dir = args.capture_dir.unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create capture directory: {}", dir.display()))?;
        let capture = CaptureFile::create_in(&dir).context("Failed to create capture file")?;
        info!(path = %capture.path().display(), "archiving UBX frames");
        session = session.with_sink(capture);
    }

    info!(port = %port, baud = args.serial.baud, udp = %args.udp, "acquisition started");
    while session
        .step(&mut source)
        .context("Acquisition stopped")?
        .is_some()
    {
        if !session.state().new_heading() {
            continue;
        }
        let snapshot = session.state().snapshot();
        session.state_mut().clear_heading_flag();
        if !snapshot.heading_valid {
            debug!(heading = snapshot.heading, "receiver flagged heading invalid, not published");
            continue;
        }
        let heading = snapshot.heading;
        let hdt = nmea::hdt(heading, &args.talker);
        let ths = nmea::ths(heading, ThsMode::Autonomous, &args.talker);
        if !args.quiet {
            print!("{hdt}");
        }
        for sentence in [&ths, &hdt] {
            if let Err(err) = socket.send_to(sentence.as_bytes(), args.udp) {
                warn!(target_addr = %args.udp, error = %err, "heading sentence not sent");
            }
        }
    }

    let summary = session.summary();
    info!(
        ubx = summary.frames.ubx,
        headings = summary.decoded.nav_relposned,
        dropped = summary.dropped(),
        "stream ended"
    );
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report = if args.stdout {
        None
    } else {
        let report = args.report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&report, &input_abs)?;
        Some(report)
    };

    let summary = navmux_core::replay_file(&resolved_input).context("Replay failed")?;
    let json = serialize_summary(&summary, args.pretty, args.compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report, json)
        .with_context(|| format!("Failed to write summary: {}", report.display()))?;

    if !args.quiet {
        eprintln!("OK: summary written -> {}", report.display());
    }
    Ok(())
}

fn cmd_ports() -> Result<(), CliError> {
    let ports = discovery::list_candidate_ports().map_err(|err| {
        CliError::new(
            format!("could not enumerate serial ports: {err}"),
            Some("check USB permissions (e.g. the dialout group)".to_string()),
        )
    })?;
    if ports.is_empty() {
        eprintln!("no u-blox receivers found");
        return Ok(());
    }
    for port in ports {
        println!(
            "{}\t{}\t{}",
            port.name,
            port.serial_number.as_deref().unwrap_or("-"),
            port.product.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_identify(args: IdentifyArgs) -> Result<(), CliError> {
    let roles = load_roles(args.serial.roles.as_deref())?;
    let found = discovery::identify(&args.port, args.serial.baud, args.serial.timeout(), &roles)
        .with_context(|| format!("Failed to poll {}", args.port))?;
    print_identification(&found)
}

fn print_identification(found: &Identification) -> Result<(), CliError> {
    let Some(id) = found.unique_id else {
        return Err(CliError::new(
            format!("no SEC-UNIQID response on {}", found.port),
            Some("check the baud rate and that UBX output is enabled".to_string()),
        ));
    };
    let role = found.role.map_or("unassigned", DeviceRole::as_str);
    println!("{}\t{}\t{}", found.port, id, role);
    Ok(())
}

fn locate_role(
    role: DeviceRole,
    roles: &RoleTable,
    serial: &SerialArgs,
) -> Result<Identification, CliError> {
    if roles.ids_for(role).next().is_none() {
        return Err(CliError::new(
            format!("no unique id is assigned the role '{role}'"),
            Some("pass --roles with a table that maps an id to this role".to_string()),
        ));
    }
    discovery::find_port_for_role(role, roles, serial.baud, serial.timeout())
        .context("Receiver discovery failed")?
        .ok_or_else(|| {
            CliError::new(
                format!("no connected receiver has the role '{role}'"),
                Some("run `navmux ports` and `navmux identify --port ...`".to_string()),
            )
        })
}

fn load_roles(path: Option<&Path>) -> Result<RoleTable, CliError> {
    match path {
        None => Ok(RoleTable::new()),
        Some(path) => RoleTable::load(path).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some(r#"expected a JSON object like {"0a1b2c3d4e": "heading"}"#.to_string()),
            )
        }),
    }
}

fn serialize_summary(
    summary: &SessionSummary,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(summary)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(summary)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn ensure_distinct_output(report: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent).ok(),
        _ => fs::canonicalize(".").ok(),
    };
    let (Some(dir), Some(name)) = (report_dir, report.file_name()) else {
        return Ok(());
    };
    if dir.join(name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a capture written by `navmux run` (.ubx) or a raw serial log".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a single capture file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        n => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if n > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({n} matches); matches: {listed}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
