use nice_td::io::NiceTreeDecompositionWriter;
use nice_td::labeling::SchedulePolicy;
use nice_td::pipeline::{split_file_arguments, Pipeline};
use nice_td::solver::ExactSolver;
use nice_td::Error;
use std::fs::OpenOptions;
use std::io::{stdout, BufWriter};
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "nice-td-cli",
    about = "Turns a tree decomposition of a graph into a labeled nice tree decomposition."
)]
struct Opt {
    /// Input graph, using the .gr format of the PACE challenge.
    #[structopt(parse(from_os_str))]
    graph: PathBuf,

    /// Optional tree decomposition (.td) and optional output file. A single
    /// file is read as decomposition if it ends in `.td`, otherwise it is the
    /// output file. Without a decomposition an optimal one is computed, without
    /// an output file the result goes to `stdout`.
    #[structopt(parse(from_os_str), max_values = 2)]
    files: Vec<PathBuf>,

    /// Introduce edges by scanning all nodes in index order instead of along
    /// root paths.
    #[structopt(long)]
    canonical_order: bool,

    /// Refuse to compute decompositions of components larger than this.
    #[structopt(long)]
    max_order: Option<usize>,

    /// Also solve minimum dominating set on the nice decomposition and print
    /// it as a `c` comment line after the decomposition.
    #[structopt(long)]
    dominating_set: bool,
}

fn run(opt: Opt) -> Result<(), Error> {
    let (td_path, output) = split_file_arguments(opt.files);
    let policy = if opt.canonical_order {
        SchedulePolicy::CanonicalOrder
    } else {
        SchedulePolicy::RootPath
    };
    let pipeline = Pipeline::default()
        .solver(Box::new(ExactSolver::default().max_order(opt.max_order)))
        .schedule_policy(policy);
    if td_path.is_none() {
        eprintln!("c computing an optimal tree decomposition, this may take a while");
    }
    let (_, nice) = pipeline.run_files(&opt.graph, td_path.as_deref())?;
    let dominating_set = if opt.dominating_set {
        Some(pipeline.dominating_set(&nice)?)
    } else {
        None
    };

    match output {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            NiceTreeDecompositionWriter::new(&nice, BufWriter::new(file)).output()?;
        }
        None => {
            let stdout = stdout();
            NiceTreeDecompositionWriter::new(&nice, stdout.lock()).output()?;
        }
    }
    if let Some(set) = dominating_set {
        let vertices: Vec<String> = set.vertices.iter().map(|v| v.to_string()).collect();
        println!(
            "c minimum dominating set of size {}: {}",
            set.size,
            vertices.join(" ")
        );
    }
    Ok(())
}

fn main() {
    #[cfg(feature = "pace-logging")]
    nice_td::logging::build_pace_logger();

    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        eprintln!("c error: {}", e);
        process::exit(1);
    }
}
