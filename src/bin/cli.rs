//! BlobDB CLI
//!
//! Tools for blob log files:
//! - `inspect`: print the header and verify every record
//! - `load`: write blobs from several threads, then read them all back

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

use blobdb::log::BlobLogReader;
use blobdb::{BlobDb, CompressionType, Config, MemStore};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// BlobDB CLI
#[derive(Parser, Debug)]
#[command(name = "blobdb-cli")]
#[command(about = "Inspect and exercise BlobDB blob logs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the header of a blob log and verify every record
    Inspect {
        /// Path to the blob log file
        path: PathBuf,

        /// Print one line per record
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write blobs concurrently, then read them back
    Load {
        /// Blob directory (the log file is recreated)
        #[arg(short, long, default_value = "./blobdb_data")]
        dir: PathBuf,

        /// Total number of blobs to write
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Size of each value in bytes
        #[arg(short = 's', long, default_value = "4096")]
        value_size: usize,

        /// Number of writer threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Payload compression
        #[arg(long, value_enum, default_value = "lz4")]
        compression: CompressionArg,

        /// Sync interval in MB
        #[arg(long, default_value = "128")]
        sync_mb: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompressionArg {
    None,
    Lz4,
}

impl From<CompressionArg> for CompressionType {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionType::None,
            CompressionArg::Lz4 => CompressionType::Lz4,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blobdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let outcome = match args.command {
        Commands::Inspect { path, verbose } => inspect(&path, verbose),
        Commands::Load {
            dir,
            count,
            value_size,
            threads,
            compression,
            sync_mb,
        } => load(dir, count, value_size, threads, compression.into(), sync_mb),
    };

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

// =============================================================================
// inspect
// =============================================================================

fn inspect(path: &Path, verbose: bool) -> blobdb::Result<()> {
    let reader = BlobLogReader::open(path)?;
    let header = reader.read_header()?;

    println!("file:        {}", path.display());
    println!("size:        {} bytes", reader.file_size()?);
    println!("version:     {}", header.version());
    println!("compression: {}", header.compression());
    println!("has_ttl:     {}", header.has_ttl());
    if let (Some(earliest), Some(latest)) = (header.earliest(), header.latest()) {
        println!("ttl range:   {} .. {}", earliest, latest);
    }

    let mut records = 0u64;
    let mut value_bytes = 0u64;
    for item in reader.iter()? {
        let (handle, key, value) = item?;
        records += 1;
        value_bytes += value.len() as u64;
        if verbose {
            println!(
                "  offset={} size={} key={} value_len={}",
                handle.offset(),
                handle.size(),
                String::from_utf8_lossy(&key),
                value.len()
            );
        }
    }

    println!("records:     {}", records);
    println!("value bytes: {}", value_bytes);
    Ok(())
}

// =============================================================================
// load
// =============================================================================

fn load(
    dir: PathBuf,
    count: usize,
    value_size: usize,
    threads: usize,
    compression: CompressionType,
    sync_mb: u64,
) -> blobdb::Result<()> {
    let threads = threads.max(1);
    let config = Config::builder()
        .blob_dir(&dir)
        .compression(compression)
        .bytes_per_sync(sync_mb * 1024 * 1024)
        .build();

    let store = Arc::new(MemStore::new(&dir));
    let db = BlobDb::open(config, store)?;

    tracing::info!(count, value_size, threads, "Loading blobs");
    let started = Instant::now();

    let written = crossbeam::thread::scope(|s| -> blobdb::Result<usize> {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let db = &db;
                s.spawn(move |_| -> blobdb::Result<usize> {
                    let mut n = 0;
                    for i in (t..count).step_by(threads) {
                        db.put(&load_key(i), &load_value(i, value_size))?;
                        n += 1;
                    }
                    Ok(n)
                })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle.join().map_err(|_| thread_panicked())??;
        }
        Ok(total)
    })
    .map_err(|_| thread_panicked())??;

    let write_elapsed = started.elapsed();
    let started = Instant::now();

    for i in 0..count {
        let value = db.get(&load_key(i))?;
        if value != load_value(i, value_size) {
            return Err(blobdb::BlobError::Corruption(format!(
                "value mismatch for key {}",
                i
            )));
        }
    }
    let read_elapsed = started.elapsed();

    let stats = db.writer_stats();
    println!("written:     {} blobs", written);
    println!("log size:    {} bytes", db.writer_offset());
    println!("syncs:       {}", stats.syncs);
    println!("write time:  {:?}", write_elapsed);
    println!("read time:   {:?}", read_elapsed);

    db.close()
}

fn thread_panicked() -> blobdb::BlobError {
    blobdb::BlobError::Io(io::Error::other("writer thread panicked"))
}

fn load_key(i: usize) -> Vec<u8> {
    format!("key{:010}", i).into_bytes()
}

/// Deterministic, mildly compressible value for key `i`
fn load_value(i: usize, size: usize) -> Vec<u8> {
    (0..size).map(|j| ((i + j / 16) % 251) as u8).collect()
}
