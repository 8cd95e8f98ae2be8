use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process;

use tabmodel::config::Options;
use tabmodel::data::Dataset;
use tabmodel::io::{read_table, write_chain};
use tabmodel::model::Model;
use tabmodel::model::families::from_descriptor;
use tabmodel::update::update;

#[derive(Parser)]
#[command(
    name = "tabmodel",
    version,
    about = "Fit, evaluate and update parametric models on tab-separated tables",
    long_about = "Models are named like `gamma` or `normal:0,1`; the optional list after the \
                 colon sets the parameters. Numeric columns of the table are the data."
)]
struct Cli {
    /// TOML file of run options
    #[arg(long, global = true, value_name = "OPTIONS")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a model's parameters from a table
    Estimate {
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Model to fit, e.g. `poisson`
        #[arg(long, value_name = "NAME")]
        model: String,
    },

    /// Combine a prior with the likelihood of a table into a posterior
    Update {
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Parameterized prior, e.g. `gamma:2,1`
        #[arg(long, value_name = "SPEC")]
        prior: String,

        /// Likelihood model, e.g. `exponential`
        #[arg(long, value_name = "SPEC")]
        likelihood: String,

        /// Seed for the Metropolis-Hastings walk; taken from the options otherwise
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Evaluate a parameterized model's CDF at every row of a table
    Cdf {
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        #[arg(long, value_name = "SPEC")]
        model: String,
    },
}

fn init_logging(options: &Options) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(options.log_level());
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }
    builder.init();
}

fn parameterized(descriptor: &str) -> Result<Model, Box<dyn Error>> {
    let model = from_descriptor(descriptor)?;
    if model.parameters.is_none() {
        return Err(format!("'{descriptor}' needs parameters, e.g. '{descriptor}:1,1'").into());
    }
    Ok(model)
}

fn run_estimate(table: PathBuf, descriptor: &str, options: &Options) -> Result<(), Box<dyn Error>> {
    let data = read_table(&table)?;
    let mut model = from_descriptor(descriptor)?;
    model.settings.insert(options.mle.clone());
    let fitted = model.estimate(&data)?;
    println!("{}", fitted.name);
    if let Some(parameters) = fitted.parameters.as_ref() {
        write_chain(io::stdout().lock(), parameters)?;
    }
    if let Some(ll) = fitted.log_likelihood {
        println!("log likelihood\t{ll}");
    }
    Ok(())
}

fn run_update(
    table: PathBuf,
    prior: &str,
    likelihood: &str,
    seed: Option<u64>,
    options: &mut Options,
) -> Result<(), Box<dyn Error>> {
    let data = read_table(&table)?;
    let prior = parameterized(prior)?;
    let likelihood = from_descriptor(likelihood)?;
    let seed = seed.unwrap_or_else(|| options.next_seed());
    let mut rng = StdRng::seed_from_u64(seed);
    let posterior = update(&data, &prior, &likelihood, None, &mut rng, &options.update)?;
    print!("{posterior}");
    Ok(())
}

fn run_cdf(table: PathBuf, descriptor: &str, options: &mut Options) -> Result<(), Box<dyn Error>> {
    let data = read_table(&table)?;
    let mut model = parameterized(descriptor)?;
    let matrix = data.matrix_or_err()?;
    for (i, row) in matrix.rows().into_iter().enumerate() {
        let point = Dataset::from(row.to_owned());
        println!("{i}\t{}", model.cdf(&point, options)?);
    }
    Ok(())
}

fn main() {
    let Cli { config, command } = Cli::parse();

    let mut options = match config.as_deref().map(Options::load).transpose() {
        Ok(options) => options.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    init_logging(&options);

    let result = match command {
        Commands::Estimate { table, model } => run_estimate(table, &model, &options),
        Commands::Update {
            table,
            prior,
            likelihood,
            seed,
        } => run_update(table, &prior, &likelihood, seed, &mut options),
        Commands::Cdf { table, model } => run_cdf(table, &model, &mut options),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
