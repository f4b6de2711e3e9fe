//! Generates payload models for the shared fixture into `OUT_DIR`.
use std::path::PathBuf;

use anyhow::Context as _;

fn main() -> anyhow::Result<()> {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/asyncapi.yml");
    println!("cargo:rerun-if-changed={}", fixture.display());

    let doc = mqtt_modelgen::schema::load_path(&fixture)?;
    let compilation = mqtt_modelgen::compile(&doc)?;
    let artifacts = mqtt_modelgen::render(&compilation, "mqtt_modelgen")?;

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR is set by cargo")?);
    mqtt_modelgen::pipeline::write_artifacts(&artifacts, &out_dir)?;
    Ok(())
}
