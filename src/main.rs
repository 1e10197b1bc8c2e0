use std::path::PathBuf;

use clap::Parser;
use ndarray::Array1;

use peeler::catalogue::Catalogue;
use peeler::config::PeelerConfig;
use peeler::io::{ChunkSource, WavChunkSource};
use peeler::output::{create_sink, ProcessedSignalWriter, SpikeSink};
use peeler::preprocess::{build_preprocessor, SignalPreprocessor};
use peeler::Peeler;

#[derive(Parser, Debug)]
#[command(name = "peel_wav")]
#[command(about = "Streaming template-subtraction spike sorter", long_about = None)]
struct Args {
    /// Input WAV recording.
    input: PathBuf,

    /// Catalogue file (JSON), produced offline by a catalogue-builder.
    #[arg(short = 'c', long)]
    catalogue: PathBuf,

    /// Number of peel passes per chunk.
    #[arg(short = 'n', long, default_value = "2")]
    n_peel_level: usize,

    /// Samples per processing chunk.
    #[arg(long, default_value = "1024")]
    chunksize: usize,

    /// Output spike-table path.
    #[arg(short = 'o', long, default_value = "spikes.csv")]
    output: PathBuf,

    /// Output path for the persisted processed (post-peel residual) signal.
    #[arg(long, default_value = "processed.wav")]
    processed_signal: PathBuf,

    /// Output format: csv or json.
    #[arg(short = 'f', long, default_value = "csv")]
    format: String,

    /// Increase output verbosity (-v for debug, -vv for trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let catalogue_json = std::fs::read_to_string(&args.catalogue)?;
    let catalogue: Catalogue = serde_json::from_str(&catalogue_json)?;

    let mut source = WavChunkSource::open(&args.input)?;
    let sample_rate = source.sample_rate();
    let n_channels = source.n_channels();

    println!("=== peel_wav ===");
    println!("Input: {}", args.input.display());
    println!("Sample rate: {} Hz, channels: {}", sample_rate, n_channels);
    println!("Clusters in catalogue: {}", catalogue.n_clusters());
    println!("n_peel_level: {}", args.n_peel_level);
    println!();

    let mut config = PeelerConfig::default();
    config.chunking.chunksize = args.chunksize;
    config.peel.n_peel_level = args.n_peel_level;

    let medians = if catalogue.signals_medians.len() == n_channels {
        catalogue.signals_medians.clone()
    } else {
        Array1::zeros(n_channels)
    };
    let mads = if catalogue.signals_mads.len() == n_channels {
        catalogue.signals_mads.clone()
    } else {
        Array1::ones(n_channels)
    };

    let mut preprocessor = build_preprocessor(
        &config.preprocess,
        sample_rate,
        n_channels,
        medians,
        mads,
    )?;

    let mut peeler = Peeler::new(&config, std::sync::Arc::new(catalogue))?;
    let mut sink: Box<dyn SpikeSink> = create_sink(&args.format, &args.output)?;
    let mut processed_writer =
        ProcessedSignalWriter::create(&args.processed_signal, sample_rate, n_channels)?;

    let mut pos: u64 = 0;
    let mut total_spikes = 0u64;

    while let Some(raw) = source.next_chunk(args.chunksize)? {
        let m = raw.shape()[0] as u64;
        if let Some((abs_head, preprocessed)) = preprocessor.process(pos, &raw)? {
            let out = peeler.process_chunk(abs_head, preprocessed.view())?;
            processed_writer.write_chunk(peeler.live_signal())?;
            if !out.spikes.is_empty() {
                sink.write_batch(&out.spikes)?;
                total_spikes += out.spikes.len() as u64;
            }
        }
        pos += m;
    }

    sink.flush()?;
    processed_writer.finalize()?;
    println!("Total spikes emitted: {total_spikes}");

    Ok(())
}
