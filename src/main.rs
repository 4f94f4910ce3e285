use clap::{ArgAction, Parser};
use op_codegen::codegen::DEFAULT_DECLARATIONS_PATH;
use op_codegen::{GenerateOptions, Result, Subset, generate_code, load_declarations, select};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-code")]
#[command(
    about = "Autogenerate operator bindings, dispatch wrappers and metadata",
    long_about = None
)]
struct Cli {
    /// Operator declarations file (YAML or JSON).
    #[arg(long, default_value = DEFAULT_DECLARATIONS_PATH)]
    declarations_path: PathBuf,

    /// Output root; also receives the python metadata.
    #[arg(long, alias = "install_dir")]
    install_dir: Option<PathBuf>,

    /// Subset of passes to run. Runs all of them when omitted.
    #[arg(long, value_enum)]
    subset: Option<Subset>,

    /// Skip generating autograd related code.
    #[arg(long)]
    disable_autograd: bool,

    /// YAML list of operators to include for a custom build.
    #[arg(long)]
    selected_op_list_path: Option<PathBuf>,

    /// Operator to include for a custom build, in addition to the list file.
    /// Repeatable, e.g. --selected-op aten::add.Tensor.
    #[arg(long = "selected-op")]
    selected_ops: Vec<String>,

    /// Emit schema-only registrations for operators that are not selected.
    #[arg(long, alias = "force_schema_registration")]
    force_schema_registration: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    // 1) Selection policy (fails only if the list file cannot be read).
    let selector =
        select::load_selector(cli.selected_op_list_path.as_deref(), &cli.selected_ops)?;

    // 2) Registry.
    let decls = load_declarations(&cli.declarations_path)?;

    // 3) Passes.
    let options = GenerateOptions {
        subset: cli.subset,
        install_dir: cli.install_dir,
        disable_autograd: cli.disable_autograd,
        force_schema_registration: cli.force_schema_registration,
    };
    let dirs = generate_code(&decls, &selector, &options)?;

    for dir in dirs.all() {
        println!("Output directory: {}", dir.display());
    }

    Ok(())
}
