//! CLI command definitions using clap

use apuforge_kernel::ServiceKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// apuforge - derive and operate a local llama.cpp stack on AMD APUs
#[derive(Parser)]
#[command(name = "apuforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command. They layer on top of the overrides
/// file and `APUFORGE__*` environment variables.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Overrides file (defaults to apuforge.{toml,yaml,yml,json} in the working directory)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Hardware profile key
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Disable a service (repeatable)
    #[arg(long, global = true, value_parser = parse_service_kind)]
    pub disable: Vec<ServiceKind>,

    /// Select a model for a service, as KIND=KEY (repeatable)
    #[arg(long = "model-for", global = true, value_name = "KIND=KEY", value_parser = parse_model_choice)]
    pub models: Vec<(ServiceKind, String)>,

    /// Directory holding the GGUF model folders
    #[arg(long, global = true)]
    pub models_root: Option<PathBuf>,

    /// llama.cpp checkout
    #[arg(long, global = true)]
    pub engine_root: Option<PathBuf>,

    /// ROCm installation root
    #[arg(long, global = true)]
    pub runtime_root: Option<PathBuf>,

    /// Artifact output directory
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,
}

pub fn parse_service_kind(s: &str) -> Result<ServiceKind, String> {
    s.parse::<ServiceKind>().map_err(|e| e.to_string())
}

fn parse_model_choice(s: &str) -> Result<(ServiceKind, String), String> {
    let (kind, key) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=KEY, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing model key in '{s}'"));
    }
    Ok((parse_service_kind(kind.trim())?, key.to_string()))
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the configuration and write every artifact
    Generate {
        /// Compare the output directory with the rendered set without writing
        #[arg(long)]
        check: bool,
    },

    /// Print the resolved active configuration
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve only and report the first configuration error
    Validate,

    /// Print one artifact to stdout
    Render {
        /// Artifact to render
        artifact: ArtifactArg,

        /// Service for per-service artifacts (defaults to the primary service)
        #[arg(short, long, value_parser = parse_service_kind)]
        service: Option<ServiceKind>,
    },

    /// List registry entries
    List {
        /// Registry to list
        what: ListTarget,

        /// Restrict models to one service kind
        #[arg(short, long, value_parser = parse_service_kind)]
        kind: Option<ServiceKind>,
    },

    /// Check the host for everything the stack needs
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit non-zero when any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Configure and build llama.cpp under the engine root
    Build {
        /// GPU backend (defaults to the hardware profile's build)
        #[arg(short, long)]
        backend: Option<Backend>,

        /// GPU architecture for ROCm builds
        #[arg(short, long)]
        arch: Option<String>,

        /// Print the commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Start one inference service in the foreground
    Serve {
        /// Service to start
        #[arg(value_parser = parse_service_kind)]
        kind: ServiceKind,

        /// Catalog model key
        #[arg(short, long)]
        model: Option<String>,

        /// Context size: small, medium, large, max or a token count
        #[arg(long)]
        ctx: Option<String>,

        /// Serve this GGUF file instead of a catalog model
        #[arg(long)]
        model_file: Option<PathBuf>,

        /// Extra engine flag appended after the derived flags (repeatable)
        #[arg(long = "flag", allow_hyphen_values = true)]
        flags: Vec<String>,

        /// Print the command without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Open, close or inspect the gateway port in the host firewall
    Firewall {
        action: FirewallAction,

        /// Print the commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Measure generation throughput through the gateway
    Bench {
        /// Gateway base URL (defaults to the configured listener on localhost)
        #[arg(long, global = true)]
        url: Option<String>,

        /// Tokens to generate per request
        #[arg(long, global = true, default_value_t = 128)]
        max_tokens: u32,

        #[command(subcommand)]
        mode: BenchCommands,
    },
}

#[derive(Subcommand)]
pub enum BenchCommands {
    /// Repeat one request against one model
    Single {
        /// Model or alias (defaults to the chat model)
        #[arg(short, long)]
        model: Option<String>,

        /// Number of requests
        #[arg(short = 'n', long, default_value_t = 3)]
        runs: usize,

        /// Prompt text
        #[arg(long, default_value = "Write a haiku about unified memory.")]
        prompt: String,
    },

    /// Run the same request against several models or aliases
    Compare {
        /// Models or aliases (defaults to the chat service's aliases)
        models: Vec<String>,

        /// Requests per model
        #[arg(short = 'n', long, default_value_t = 2)]
        runs: usize,
    },

    /// Issue concurrent requests
    Stress {
        #[arg(short, long)]
        model: Option<String>,

        /// Requests in flight at once
        #[arg(short = 'j', long, default_value_t = 4)]
        concurrency: usize,
    },

    /// Grow the prompt through a size ladder
    Context {
        #[arg(short, long)]
        model: Option<String>,

        /// Approximate prompt sizes in tokens
        #[arg(long, value_delimiter = ',', default_values_t = [512u32, 2048, 8192, 32768])]
        sizes: Vec<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactArg {
    Launch,
    Unit,
    Routing,
    Aliases,
    Docs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Models,
    Profiles,
    Endpoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Rocm,
    Vulkan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FirewallAction {
    Enable,
    Disable,
    Status,
}
