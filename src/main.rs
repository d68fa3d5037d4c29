use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use uneven_matrix_multiplication::config::{InputSource, RunConfig};
use uneven_matrix_multiplication::inputs;
use uneven_matrix_multiplication::observability;
use uneven_matrix_multiplication::output::OutputOptions;

/// Row-partitioned matrix multiplication C = A * B
#[derive(Parser, Debug)]
#[command(name = "uneven-matmul")]
#[command(about = "Multiply matrices by splitting the rows of A across participants")]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of participants, coordinator included
    #[arg(short, long)]
    participants: Option<usize>,

    /// Rows of A (M)
    #[arg(short = 'm', long)]
    rows: Option<usize>,

    /// Columns of A and rows of B (K)
    #[arg(short = 'k', long)]
    inner: Option<usize>,

    /// Columns of B (N)
    #[arg(short = 'n', long)]
    cols: Option<usize>,

    /// Path to matrix A (text format)
    #[arg(long, requires = "matrix_b")]
    matrix_a: Option<PathBuf>,

    /// Path to matrix B (text format)
    #[arg(long, requires = "matrix_a")]
    matrix_b: Option<PathBuf>,

    /// Path to write C to (text format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print C to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(p) = self.participants {
            config.participants = p;
        }

        let dims_overridden = self.rows.is_some() || self.inner.is_some() || self.cols.is_some();
        if let Some(m) = self.rows {
            config.dimensions.m = m;
        }
        if let Some(k) = self.inner {
            config.dimensions.k = k;
        }
        if let Some(n) = self.cols {
            config.dimensions.n = n;
        }
        if dims_overridden && config.input == InputSource::Reference {
            config.input = InputSource::Sequential;
        }

        if let (Some(a), Some(b)) = (self.matrix_a, self.matrix_b) {
            config.input = InputSource::Files { a, b };
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        if self.quiet {
            config.print = false;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    observability::init_logging(&config.log_level)?;

    let output = OutputOptions {
        print: config.print,
        path: config.output.clone(),
    };

    run(&config, &output)
}

#[cfg(not(feature = "mpi"))]
fn run(config: &RunConfig, output: &OutputOptions) -> anyhow::Result<()> {
    use uneven_matrix_multiplication::run_local;

    info!(participants = config.participants, "Starting in-process world");
    let (a, b) = inputs::load(&config.input, config.dimensions)?;
    let c = run_local(config.participants, a, b, output)?;
    info!(rows = c.rows, cols = c.cols, "Run finished");
    Ok(())
}

#[cfg(feature = "mpi")]
fn run(config: &RunConfig, output: &OutputOptions) -> anyhow::Result<()> {
    use mpi::traits::Communicator as _;
    use tracing::warn;
    use uneven_matrix_multiplication::{Coordinator, Worker};

    let universe = mpi::initialize().context("Failed to initialize MPI")?;
    let world = universe.world();
    let size = world.size() as usize;

    if world.rank() == 0 {
        if size != config.participants {
            warn!(
                configured = config.participants,
                launched = size,
                "Participant count is set by mpirun; using the launched world"
            );
        }
        info!(participants = size, "Starting coordinator");
        let (a, b) = inputs::load(&config.input, config.dimensions)?;
        let mut coordinator = Coordinator::new(world);
        let c = coordinator.multiply_matrices(a, b, output)?;
        info!(rows = c.rows, cols = c.cols, "Run finished");
    } else {
        let mut worker = Worker::<_, i64>::new(world);
        worker.process_work()?;
    }
    Ok(())
}
