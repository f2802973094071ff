//! Command-line demonstration harness for simkit's engines.
//!
//! Not part of the core: host-language object wrapping and argument
//! parsing are external collaborators, not part of the core. This binary
//! is that collaborator: it parses arguments, reads plain-text
//! line-delimited inputs, and prints results a caller embedding the core
//! directly would instead receive as raw buffers.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use simkit_core::{CapabilityMask, DeviceScope, SliceSequence};
use simkit_kernels::{
    detect_full_capability, FingerprintsEngine, GapCosts, LevenshteinEngine, LevenshteinUtf8Engine,
    NeedlemanWunschEngine, SmithWatermanEngine, StridedMatrixWriter, StridedWriter,
    SubstitutionMatrix, UniformCosts,
};

#[derive(Parser)]
#[command(name = "simkit")]
#[command(about = "Batched string-similarity and fingerprinting kernels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the detected runtime capability mask
    Capabilities,

    /// Byte- or UTF-8-level Levenshtein distance over paired line files
    Levenshtein {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long, default_value_t = 0)]
        match_cost: i32,
        #[arg(long, default_value_t = 1)]
        mismatch_cost: i32,
        #[arg(long)]
        gap: Option<i32>,
        #[arg(long)]
        gap_open: Option<i32>,
        #[arg(long)]
        gap_extend: Option<i32>,
        /// Decode inputs as UTF-8 code points instead of raw bytes
        #[arg(long, default_value_t = false)]
        utf8: bool,
        #[arg(long, value_parser = parse_capability)]
        capability: Option<CapabilityMask>,
    },

    /// Needleman-Wunsch global alignment score over paired line files
    NeedlemanWunsch {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long, default_value_t = 1)]
        diagonal: i32,
        #[arg(long, default_value_t = -1)]
        off_diagonal: i32,
        #[arg(long)]
        gap: Option<i32>,
        #[arg(long)]
        gap_open: Option<i32>,
        #[arg(long)]
        gap_extend: Option<i32>,
    },

    /// Smith-Waterman local alignment score over paired line files
    SmithWaterman {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long, default_value_t = 1)]
        diagonal: i32,
        #[arg(long, default_value_t = -1)]
        off_diagonal: i32,
        #[arg(long)]
        gap: Option<i32>,
        #[arg(long)]
        gap_open: Option<i32>,
        #[arg(long)]
        gap_extend: Option<i32>,
    },

    /// MinHash rolling-hash fingerprints over a line-delimited text file
    Fingerprint {
        #[arg(long)]
        texts: PathBuf,
        #[arg(long, default_value_t = 128)]
        ndim: usize,
        #[arg(long, value_delimiter = ',')]
        window_widths: Option<Vec<usize>>,
        #[arg(long)]
        alphabet_size: Option<u32>,
    },
}

fn parse_capability(s: &str) -> Result<CapabilityMask, String> {
    s.parse().map_err(|e: simkit_core::SimkitError| e.to_string())
}

fn resolve_gap(
    gap: Option<i32>,
    open: Option<i32>,
    extend: Option<i32>,
    default_linear: i32,
) -> Result<GapCosts> {
    match (gap, open, extend) {
        (Some(g), None, None) => Ok(GapCosts::linear(g)?),
        (None, Some(open), Some(extend)) => Ok(GapCosts::affine(open, extend)?),
        (None, None, None) => Ok(GapCosts::linear(default_linear)?),
        _ => bail!("pass either --gap, or both --gap-open and --gap-extend, but not both forms"),
    }
}

fn read_lines(path: &PathBuf) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(content.lines().map(|l| l.to_string()).collect())
}

fn paired_lines(a_path: &PathBuf, b_path: &PathBuf) -> Result<(Vec<String>, Vec<String>)> {
    let a = read_lines(a_path)?;
    let b = read_lines(b_path)?;
    if a.len() != b.len() {
        bail!(
            "{} has {} lines but {} has {} lines; inputs must be paired one-to-one",
            a_path.display(),
            a.len(),
            b_path.display(),
            b.len()
        );
    }
    Ok((a, b))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Capabilities => {
            let detected = detect_full_capability();
            println!("detected: {detected}");
            println!("gpu probe: {}", describe_gpu_probe());
        }

        Commands::Levenshtein {
            a,
            b,
            match_cost,
            mismatch_cost,
            gap,
            gap_open,
            gap_extend,
            utf8,
            capability,
        } => {
            let (a_lines, b_lines) = paired_lines(&a, &b)?;
            let costs = UniformCosts::new(match_cost, mismatch_cost)?;
            let gap = resolve_gap(gap, gap_open, gap_extend, 1)?;
            let a_view = SliceSequence::new(&a_lines);
            let b_view = SliceSequence::new(&b_lines);
            let mut out = vec![0u64; a_lines.len()];
            let writer = unsafe {
                StridedWriter::new(out.as_mut_ptr() as *mut u8, std::mem::size_of::<u64>(), out.len())
            };
            let scope = DeviceScope::default_scope();
            if utf8 {
                let engine = LevenshteinUtf8Engine::new(costs, gap, capability);
                engine.run(&scope, &a_view, &b_view, &writer)?;
            } else {
                let engine = LevenshteinEngine::new(costs, gap, capability);
                engine.run(&scope, &a_view, &b_view, &writer)?;
            }
            print_u64_column(&out);
        }

        Commands::NeedlemanWunsch {
            a,
            b,
            diagonal,
            off_diagonal,
            gap,
            gap_open,
            gap_extend,
        } => {
            let (a_lines, b_lines) = paired_lines(&a, &b)?;
            let matrix = SubstitutionMatrix::identity(diagonal, off_diagonal)?;
            let gap = resolve_gap(gap, gap_open, gap_extend, -1)?;
            let a_view = SliceSequence::new(&a_lines);
            let b_view = SliceSequence::new(&b_lines);
            let mut out = vec![0i64; a_lines.len()];
            let writer = unsafe {
                StridedWriter::new(out.as_mut_ptr() as *mut u8, std::mem::size_of::<i64>(), out.len())
            };
            let engine = NeedlemanWunschEngine::new(matrix, gap, None);
            engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)?;
            print_i64_column(&out);
        }

        Commands::SmithWaterman {
            a,
            b,
            diagonal,
            off_diagonal,
            gap,
            gap_open,
            gap_extend,
        } => {
            let (a_lines, b_lines) = paired_lines(&a, &b)?;
            let matrix = SubstitutionMatrix::identity(diagonal, off_diagonal)?;
            let gap = resolve_gap(gap, gap_open, gap_extend, -1)?;
            let a_view = SliceSequence::new(&a_lines);
            let b_view = SliceSequence::new(&b_lines);
            let mut out = vec![0i64; a_lines.len()];
            let writer = unsafe {
                StridedWriter::new(out.as_mut_ptr() as *mut u8, std::mem::size_of::<i64>(), out.len())
            };
            let engine = SmithWatermanEngine::new(matrix, gap, None);
            engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)?;
            print_i64_column(&out);
        }

        Commands::Fingerprint {
            texts,
            ndim,
            window_widths,
            alphabet_size,
        } => {
            let lines = read_lines(&texts)?;
            let engine = FingerprintsEngine::new(ndim, window_widths, alphabet_size, None)?;
            let view = SliceSequence::new(&lines);
            let mut hashes = vec![0u32; lines.len() * ndim];
            let mut counts = vec![0u32; lines.len() * ndim];
            let row_stride = ndim * std::mem::size_of::<u32>();
            let (hashes_w, counts_w) = unsafe {
                (
                    StridedMatrixWriter::new(hashes.as_mut_ptr() as *mut u8, row_stride, lines.len(), ndim),
                    StridedMatrixWriter::new(counts.as_mut_ptr() as *mut u8, row_stride, lines.len(), ndim),
                )
            };
            engine.run(&DeviceScope::default_scope(), &view, &hashes_w, &counts_w)?;
            for row in 0..lines.len() {
                let row_hashes = &hashes[row * ndim..(row + 1) * ndim];
                let row_counts = &counts[row * ndim..(row + 1) * ndim];
                let summary = serde_json::json!({
                    "text": lines[row],
                    "hashes": row_hashes,
                    "counts": row_counts,
                });
                println!("{summary}");
            }
        }
    }

    Ok(())
}

fn print_u64_column(values: &[u64]) {
    for v in values {
        println!("{v}");
    }
}

fn print_i64_column(values: &[i64]) {
    for v in values {
        println!("{v}");
    }
}

fn describe_gpu_probe() -> String {
    #[cfg(feature = "gpu")]
    {
        match simkit_gpu::detect_gpu_capability() {
            Some(mask) => format!("available ({mask})"),
            None => "not detected".to_string(),
        }
    }
    #[cfg(not(feature = "gpu"))]
    {
        "probe disabled (build with --features gpu)".to_string()
    }
}
