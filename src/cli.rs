//! Minimal CLI: schema → payload models (+ optional docs)
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{DocsSettings, Settings, DEFAULT_SUPPORT_CRATE};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile an AsyncAPI document into strictly validated Rust payload models
#[derive(Parser, Debug)]
#[command(name = "mqtt-modelgen", version, about)]
pub struct CommandLineInterface {
    /// AsyncAPI document (YAML or JSON)
    #[arg(long, env = "MODELGEN_SCHEMA", default_value = "asyncapi.yml")]
    schema: PathBuf,

    /// output directory for `payloads.rs` and `render_context.json`
    #[arg(short, long, env = "MODELGEN_OUT", default_value = ".")]
    out: PathBuf,

    /// also generate HTML documentation (needs `npx`)
    #[arg(long, env = "MODELGEN_DOCS")]
    docs: bool,

    /// documentation output directory
    #[arg(long, env = "MODELGEN_DOCS_DIR", default_value = "docs")]
    docs_dir: PathBuf,

    /// version stamped into the documentation
    #[arg(long, env = "MODELGEN_DOCS_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    docs_version: String,

    /// crate path the generated code imports `support` from
    #[arg(long, env = "MODELGEN_SUPPORT_CRATE", default_value = DEFAULT_SUPPORT_CRATE)]
    support_crate: String,

    /// more logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// debugging: print the resolved settings and exit
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            schema: self.schema.clone(),
            out_dir: self.out.clone(),
            docs: self.docs.then(|| DocsSettings {
                out_dir: self.docs_dir.clone(),
                version: self.docs_version.clone(),
            }),
            support_crate: self.support_crate.clone(),
            verbosity: self.verbose,
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let settings = self.settings();
        crate::config::init_tracing(settings.verbosity);

        // debug path
        if self.no_op {
            eprintln!("{settings:#?}");
            return Ok(());
        }
        crate::pipeline::run(&settings)
    }
}
