//! CLI entry point. Thin: parse options, init tracing, wire a
//! translator, run the pipeline (`ino_tracing` init → `clap::Parser::parse()`
//! → `debug!(?opts)` → sanity checks).

use std::sync::Arc;

use anyhow::{ ensure, Context };
use async_trait::async_trait;
use clap::Parser;
use tap::Tap;
use tracing::debug;

use rplocalize::config::CmdOpts;
use rplocalize::merger::MergedRequest;
use rplocalize::pipeline::{ self, Translator, TranslationOutcome };


/// Pass-through translator used when no external engine is wired in.
/// The pipeline never assumes anything about the translator
/// implementation; this one exists so the binary is
/// runnable standalone to preview what extraction/merging would send
/// out, via `--dry-run`.
struct IdentityTranslator;

#[ async_trait ]
impl Translator for IdentityTranslator {
    async fn translate_batch( &self, requests: &[ MergedRequest ] ) -> Vec<TranslationOutcome> {
        requests.iter()
            .map( |r| TranslationOutcome { translated_text: r.text.clone(), success: true, error: None } )
            .collect()
    }
}


#[ tokio::main ]
async fn main() -> anyhow::Result<()> {
    ino_tracing::init_tracing_subscriber();

    let opts = CmdOpts::parse();
    debug!( ?opts );

    ensure! { opts.project_dir.try_exists()?,
        "project directory \"{}\" does not exist",
        opts.project_dir.display()
    };
    ensure! { opts.project_dir.is_dir(),
        "\"{}\" is not a directory",
        opts.project_dir.display()
    };

    let cfg = opts.to_pipeline_config()
        .tap( |cfg| debug!( ?cfg, "resolved pipeline configuration" ) );

    if !cfg.dry_run {
        std::fs::create_dir_all( &cfg.backup_dir )
            .with_context( || format!( "failed to create backup directory \"{}\"", cfg.backup_dir.display() ) )?;
    }

    let backup: Arc<dyn pipeline::Backup> = Arc::new( pipeline::FilesystemBackup {
        project_dir: cfg.project_dir.clone(),
        backup_dir: cfg.backup_dir.clone(),
    } );
    let translator: Arc<dyn Translator> = Arc::new( IdentityTranslator );

    let written = pipeline::run( &cfg, translator, None, None, Some( backup ), None ).await?;

    println!( "wrote {written} file(s)" );

    Ok( () )
}
