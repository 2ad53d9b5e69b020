use clap::{Parser, ValueEnum};
use dash_manifest::mpd::{AddressingMode, TimeRange};
use dash_manifest::{refresh_representation, DashParser, DashTimelineConverter, Segment, SegmentRequest};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum LogLevel {
    Trace = 0, // Designates very fine-grained informational events, extremely verbose.
    Debug = 1, // Designates fine-grained informational events.
    Info = 2, // Designates informational messages.
    Warn = 3, // Designates hazardous situations.
    Error = 4, // Designates very serious errors.
}

#[derive(Parser, Debug)]
#[command(author, version, about = "mpd-inspector")]
struct Args {
    /// MPD document to inspect
    #[arg(short, long)]
    input: PathBuf,
    // Set the log level (possible values: error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,
    /// Segments listed per representation
    #[arg(short, long, default_value_t = 10)]
    max_segments: usize,
    /// Server minus client clock, in seconds. Marks the clock as synchronized.
    #[arg(short, long)]
    time_shift: Option<f64>,
    /// The input is an XML-to-JSON converted manifest
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RepresentationSummary {
    id: Option<String>,
    period: Option<String>,
    bandwidth: u64,
    addressing: AddressingMode,
    availability_range: Option<TimeRange>,
    segments: Vec<Segment>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(match args.log_level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        });
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(fmt_layer))?;

    info!("{:?}", args);

    let text = std::fs::read_to_string(&args.input)?;
    let parser = DashParser::new();
    let manifest = if args.json { parser.parse_json(&text)? } else { parser.parse(&text)? };

    let mut converter = DashTimelineConverter::default();
    if let Some(shift) = args.time_shift {
        converter.set_time_sync_result(shift);
    }

    let request = SegmentRequest { max_segments: Some(args.max_segments), ..Default::default() };
    let summaries: Vec<RepresentationSummary> = manifest
        .representation_ids()
        .filter_map(|id| manifest.representation_ref(id))
        .map(|rep| {
            let updated = refresh_representation(&converter, manifest.is_dynamic(), rep, &request);
            RepresentationSummary {
                id: updated.id.clone(),
                period: rep.period().id.clone(),
                bandwidth: updated.bandwidth,
                addressing: updated.addressing,
                availability_range: updated.segment_availability_range,
                segments: updated.segments().map(<[Segment]>::to_vec).unwrap_or_default(),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
