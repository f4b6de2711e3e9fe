//! Loader → synthesizer → registry → artifacts.
//!
//! Everything is rendered in memory first. Files are only touched once the
//! whole compilation succeeded, and then each lands through a temporary
//! sibling plus rename, with the previous set kept until all renames landed.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use colored::Colorize;

use crate::codegen::Codegen;
use crate::config::Settings;
use crate::context::RenderContext;
use crate::docs::DocsJob;
use crate::error::CompileError;
use crate::hoist;
use crate::ir::ClassDefinition;
use crate::registry::{self, CallbackStub};
use crate::runtime::Model;
use crate::schema::{self, Document, MessageRegistry};
use crate::synth::Synthesizer;

pub const PAYLOADS_FILE: &str = "payloads.rs";
pub const CONTEXT_FILE: &str = "render_context.json";

/// Result of one compiler run.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// Top-level message classes in schema order, each owning its auxiliaries.
    pub classes: Vec<ClassDefinition>,
    pub registry: MessageRegistry,
    pub stubs: Vec<CallbackStub>,
}

impl Compilation {
    /// Every class, auxiliaries before their owners.
    pub fn ordered_classes(&self) -> Vec<&ClassDefinition> {
        hoist::flatten(&self.classes)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.ordered_classes().into_iter().find(|c| c.name == name)
    }

    pub fn model(&self) -> Model {
        Model::new(self.ordered_classes())
    }
}

pub fn compile(doc: &Document) -> Result<Compilation, CompileError> {
    let mut synth = Synthesizer::new();
    let mut classes = Vec::with_capacity(doc.messages.len());
    for message in &doc.messages {
        tracing::info!(message = %message.name, "building class");
        let mut class = synth.emit_message(&message.name, &message.payload)?;
        if class.description.is_none() {
            class.description = message.description.clone();
        }
        classes.push(class);
    }

    let stubs = registry::callback_stubs(&doc.registry, hoist::flatten(&classes))?;
    Ok(Compilation { classes, registry: doc.registry.clone(), stubs })
}

pub fn compile_str(src: &str) -> Result<Compilation, CompileError> {
    compile(&schema::load_str(src)?)
}

/// Rendered artifacts, not yet on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub payloads_rs: String,
    pub render_context: String,
}

impl Artifacts {
    pub fn files(&self) -> [(&'static str, &str); 2] {
        [(PAYLOADS_FILE, self.payloads_rs.as_str()), (CONTEXT_FILE, self.render_context.as_str())]
    }
}

pub fn render(compilation: &Compilation, support_crate: &str) -> Result<Artifacts, CompileError> {
    let ordered = compilation.ordered_classes();

    let mut cg = Codegen::new(support_crate);
    cg.emit(&ordered, &compilation.stubs, &compilation.registry)?;
    let payloads_rs = cg.into_string();

    let context = RenderContext::new(&ordered, compilation.registry.entries(), &compilation.stubs);
    let render_context = context
        .to_json_pretty()
        .map_err(|e| CompileError::RenderContext(e.to_string()))?;

    Ok(Artifacts { payloads_rs, render_context })
}

/// Write every artifact into `out_dir`.
///
/// Files are staged as `.name.tmp` siblings first. Previous artifacts are
/// moved aside to `.name.bak` while the new ones are renamed into place and
/// restored if any rename fails, so the directory holds either the old set or
/// the new one.
pub fn write_artifacts(artifacts: &Artifacts, out_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let mut staged: Vec<Staged> = Vec::new();
    for (name, content) in artifacts.files() {
        let file = Staged {
            tmp: out_dir.join(format!(".{name}.tmp")),
            backup: out_dir.join(format!(".{name}.bak")),
            target: out_dir.join(name),
        };
        if let Err(e) = std::fs::write(&file.tmp, content) {
            let _ = std::fs::remove_file(&file.tmp);
            discard(&staged);
            return Err(e);
        }
        staged.push(file);
    }

    let mut placed: Vec<(&Staged, bool)> = Vec::with_capacity(staged.len());
    for file in &staged {
        let had_previous = file.target.is_file();
        let swapped = if had_previous { std::fs::rename(&file.target, &file.backup) } else { Ok(()) }
            .and_then(|()| std::fs::rename(&file.tmp, &file.target));
        if let Err(e) = swapped {
            if had_previous {
                let _ = std::fs::rename(&file.backup, &file.target);
            }
            rollback(&placed);
            discard(&staged);
            return Err(e);
        }
        placed.push((file, had_previous));
    }

    let mut written = Vec::with_capacity(placed.len());
    for (file, had_previous) in placed {
        if had_previous {
            let _ = std::fs::remove_file(&file.backup);
        }
        tracing::info!(path = %file.target.display(), "wrote artifact");
        written.push(file.target.clone());
    }
    Ok(written)
}

struct Staged {
    tmp: PathBuf,
    backup: PathBuf,
    target: PathBuf,
}

fn rollback(placed: &[(&Staged, bool)]) {
    for (file, had_previous) in placed.iter().rev() {
        if *had_previous {
            let _ = std::fs::rename(&file.backup, &file.target);
        } else {
            let _ = std::fs::remove_file(&file.target);
        }
    }
}

fn discard(staged: &[Staged]) {
    for file in staged {
        let _ = std::fs::remove_file(&file.tmp);
    }
}

/// One full driver run.
pub fn run(settings: &Settings) -> anyhow::Result<()> {
    let doc = schema::load_path(&settings.schema)
        .with_context(|| format!("failed to load {}", settings.schema.display()))?;
    let compilation = compile(&doc).context("schema does not compile")?;
    let artifacts = render(&compilation, &settings.support_crate)?;

    let written = write_artifacts(&artifacts, &settings.out_dir)
        .with_context(|| format!("failed to write artifacts to {}", settings.out_dir.display()))?;
    for path in &written {
        eprintln!("{} {}", "wrote".green().bold(), path.display());
    }

    if let Some(docs) = &settings.docs {
        let job = DocsJob { schema: &settings.schema, out_dir: &docs.out_dir, version: &docs.version };
        job.run().context("failed to build documentation")?;
        eprintln!("{} {}", "docs".green().bold(), docs.out_dir.display());
    }
    Ok(())
}
