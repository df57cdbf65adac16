//! twigc CLI - генерация Rust-модулей из шаблонов.
//!
//! Использование:
//!   twigc -p templates -o src/views '**/*.twig'
//!   twigc -p templates -I shared --ext twig --ext html.twig 'pages/*.twig'
//!   twigc --dump-ast 'page.twig'

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info, warn};

use twigc::{FilesystemLoader, GenError, GenResult, Generator, GeneratorConfig, Loader};

#[derive(Parser)]
#[command(name = "twigc")]
#[command(version)]
#[command(about = "Compile Twig templates into Rust source code", long_about = None)]
struct Cli {
    /// Glob pattern of templates, relative to --path
    pattern: String,

    /// Template root directory
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Extra directory searched for extended and included templates
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Extension tried when a template name has none (repeatable)
    #[arg(long = "ext", default_value = "twig")]
    extensions: Vec<String>,

    /// Path of the runtime module in generated code
    #[arg(long, default_value = "twigc::runtime")]
    runtime: String,

    /// Omit `// line L, offset O` comments
    #[arg(long)]
    no_trace: bool,

    /// Print the parsed tree as JSON instead of generating code
    #[arg(long)]
    dump_ast: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let names = match find_templates(&cli.path, &cli.pattern) {
        Ok(names) => names,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if names.is_empty() {
        warn!("no templates match {} in {}", cli.pattern, cli.path.display());
        return ExitCode::SUCCESS;
    }

    let config = GeneratorConfig {
        runtime_path: cli.runtime.clone(),
        trace_comments: !cli.no_trace,
        ..GeneratorConfig::default()
    };
    let mut loader = FilesystemLoader::new(&cli.path);
    for dir in &cli.include {
        loader.add_search_path(dir.clone());
    }
    loader.set_extensions(cli.extensions.clone());
    debug!("search paths: {:?}", loader.search_paths());
    let generator = Generator::with_config(loader, config);

    let mut failed = 0;
    for name in &names {
        let result = if cli.dump_ast {
            dump_ast(generator.loader(), name)
        } else {
            generate_file(&generator, &cli.out, name)
        };
        if let Err(e) = result {
            error!("{}: {}", name, e);
            failed += 1;
        }
    }

    if failed > 0 {
        error!("{} of {} template(s) failed", failed, names.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Имена шаблонов (относительно `root`, через `/`), подходящие под шаблон поиска.
fn find_templates(root: &Path, pattern: &str) -> GenResult<Vec<String>> {
    let full = root.join(pattern);
    let paths = glob::glob(&full.to_string_lossy())
        .map_err(|e| GenError::Io(format!("Invalid pattern {}: {}", pattern, e)))?;

    let mut names = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| GenError::Io(e.to_string()))?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let name = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn generate_file(generator: &Generator<FilesystemLoader>, out: &Path, name: &str) -> GenResult<()> {
    let code = generator.generate(name)?;

    let target = out.join(name).with_extension("rs");
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| GenError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
    }
    fs::write(&target, code)
        .map_err(|e| GenError::Io(format!("Failed to write {}: {}", target.display(), e)))?;

    info!("{} -> {}", name, target.display());
    Ok(())
}

fn dump_ast(loader: &FilesystemLoader, name: &str) -> GenResult<()> {
    let source = loader.load(name)?;
    let module = twigc::parse(&source).map_err(|source| GenError::ParseFailure {
        template: name.to_string(),
        source,
    })?;
    let json = serde_json::to_string_pretty(&module)
        .map_err(|e| GenError::Io(format!("Failed to serialize {}: {}", name, e)))?;
    println!("{}", json);
    Ok(())
}
