//! codejudge CLI.
//!
//! Front-end for the comparison engine: `compare` judges a candidate
//! source file against a reference solution and prints the verdict as
//! JSON; `tac` normalizes an IR file and prints its three-address listing.
//!
//! IR comes either from precompiled files (`--ir-reference` /
//! `--ir-candidate`) or from the hosted compile endpoint named by
//! `CODEJUDGE_IR_URL`. The optional LLM judge is configured through
//! `CODEJUDGE_JUDGE_PROVIDER`, `CODEJUDGE_JUDGE_API_KEY`,
//! `CODEJUDGE_JUDGE_MODEL` and `CODEJUDGE_JUDGE_BASE_URL`.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use codejudge_ast::Language;
use codejudge_engine::providers::{
    ChatJudge, FixedIrProducer, IrProducer, JudgeProvider, RemoteCompiler,
};
use codejudge_engine::{CompareRequest, Engine, EngineConfig, RunOptions};
use codejudge_tac::normalize;

/// Algorithmic-equivalence judge for programming submissions.
#[derive(Parser)]
#[command(name = "codejudge", about = "Judge algorithmic equivalence of two programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a candidate program against a reference solution.
    Compare {
        /// Path to the reference source file.
        #[arg(long)]
        reference: PathBuf,

        /// Path to the candidate source file.
        #[arg(long)]
        candidate: PathBuf,

        /// Source language: c or cpp.
        #[arg(short, long, default_value = "c")]
        language: String,

        /// Precompiled IR for the reference (skips the hosted compiler).
        #[arg(long)]
        ir_reference: Option<PathBuf>,

        /// Precompiled IR for the candidate.
        #[arg(long)]
        ir_candidate: Option<PathBuf>,

        /// Consult the configured LLM judge on inconclusive checks.
        #[arg(long)]
        judge: bool,

        /// Compile and run both programs and diff their stdout.
        #[arg(long)]
        run: bool,

        /// File fed to both programs as stdin when --run is set.
        #[arg(long)]
        stdin: Option<PathBuf>,
    },

    /// Normalize an IR file and print its three-address listing.
    Tac {
        /// Path to a textual IR file.
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Compare {
            reference,
            candidate,
            language,
            ir_reference,
            ir_candidate,
            judge,
            run,
            stdin,
        } => {
            run_compare(
                &reference,
                &candidate,
                &language,
                ir_reference.as_deref(),
                ir_candidate.as_deref(),
                judge,
                run,
                stdin.as_deref(),
            )
            .await
        }
        Commands::Tac { input } => run_tac(&input),
    };
    process::exit(exit_code);
}

/// Execute the compare subcommand.
///
/// Returns exit code: 0 = verdict produced, 1 = usage or I/O error,
/// 2 = verdict degraded by a collaborator failure.
#[allow(clippy::too_many_arguments)]
async fn run_compare(
    reference: &Path,
    candidate: &Path,
    language: &str,
    ir_reference: Option<&Path>,
    ir_candidate: Option<&Path>,
    judge: bool,
    run: bool,
    stdin: Option<&Path>,
) -> i32 {
    let language = match Language::from_tag(language) {
        Ok(language) => language,
        Err(err) => {
            eprintln!("Error: {}", err);
            return 1;
        }
    };

    let reference_source = match std::fs::read_to_string(reference) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: failed to read '{}': {}", reference.display(), err);
            return 1;
        }
    };
    let candidate_source = match std::fs::read_to_string(candidate) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: failed to read '{}': {}", candidate.display(), err);
            return 1;
        }
    };

    let run_options = if run {
        let stdin = match stdin {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(err) => {
                    eprintln!("Error: failed to read '{}': {}", path.display(), err);
                    return 1;
                }
            },
            None => None,
        };
        Some(RunOptions { stdin })
    } else {
        None
    };

    let request = CompareRequest {
        language,
        reference_source: reference_source.clone(),
        candidate_source: candidate_source.clone(),
        run: run_options,
    };

    let judge = if judge {
        match judge_from_env() {
            Ok(judge) => Some(judge),
            Err(msg) => {
                eprintln!("Error: {}", msg);
                return 1;
            }
        }
    } else {
        None
    };

    match (ir_reference, ir_candidate) {
        (Some(reference_ir), Some(candidate_ir)) => {
            let reference_ir = match std::fs::read_to_string(reference_ir) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("Error: failed to read IR file: {}", err);
                    return 1;
                }
            };
            let candidate_ir = match std::fs::read_to_string(candidate_ir) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("Error: failed to read IR file: {}", err);
                    return 1;
                }
            };
            let producer = FixedIrProducer::new()
                .with(reference_source, reference_ir)
                .with(candidate_source, candidate_ir);
            print_verdict(producer, judge, request).await
        }
        (None, None) => {
            let base_url = match std::env::var("CODEJUDGE_IR_URL") {
                Ok(url) => url,
                Err(_) => {
                    eprintln!(
                        "Error: set CODEJUDGE_IR_URL or pass --ir-reference/--ir-candidate"
                    );
                    return 1;
                }
            };
            print_verdict(RemoteCompiler::new(base_url), judge, request).await
        }
        _ => {
            eprintln!("Error: --ir-reference and --ir-candidate must be given together");
            1
        }
    }
}

async fn print_verdict<P: IrProducer>(
    producer: P,
    judge: Option<ChatJudge>,
    request: CompareRequest,
) -> i32 {
    let engine = Engine::new(EngineConfig::from_env(), producer, judge);
    let verdict = engine.compare(&request).await;
    match serde_json::to_string_pretty(&verdict) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("Error: failed to serialize verdict: {}", err);
            return 1;
        }
    }
    if verdict.success {
        0
    } else {
        2
    }
}

/// Builds the chat judge from `CODEJUDGE_JUDGE_*` environment variables.
fn judge_from_env() -> Result<ChatJudge, String> {
    let api_key = std::env::var("CODEJUDGE_JUDGE_API_KEY")
        .map_err(|_| "CODEJUDGE_JUDGE_API_KEY is not set".to_string())?;
    let model = std::env::var("CODEJUDGE_JUDGE_MODEL")
        .map_err(|_| "CODEJUDGE_JUDGE_MODEL is not set".to_string())?;
    let base_url = std::env::var("CODEJUDGE_JUDGE_BASE_URL").ok();

    let provider = match std::env::var("CODEJUDGE_JUDGE_PROVIDER").as_deref() {
        Ok("openai_compatible") => JudgeProvider::OpenAiCompatible {
            api_base_url: base_url
                .ok_or_else(|| "openai_compatible requires CODEJUDGE_JUDGE_BASE_URL".to_string())?,
        },
        Ok("openrouter") | Err(_) => JudgeProvider::OpenRouter {
            api_base_url: base_url,
        },
        Ok(other) => {
            return Err(format!(
                "unsupported judge provider '{}': use openrouter or openai_compatible",
                other
            ))
        }
    };
    Ok(ChatJudge::new(provider, api_key, model))
}

/// Execute the tac subcommand: 0 = printed, 1 = I/O error.
fn run_tac(input: &Path) -> i32 {
    let ir = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: failed to read '{}': {}", input.display(), err);
            return 1;
        }
    };
    let program = normalize(&ir);
    println!("{}", program.listing());
    eprintln!("{} instruction(s)", program.instruction_count());
    0
}
