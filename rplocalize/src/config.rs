//! CLI surface and configuration: a `clap::Parser` derive struct
//! driving one pipeline run end to end. `RPLOCALIZE_*` env var
//! precedence comes from workspace `clap`'s `env` feature, already
//! enabled for this crate.

use std::path::PathBuf;

use clap::Parser;

use crate::lore::{ DEFAULT_BATCH_SIZE, MERGE_MAX_SAFE_CHARS };
use crate::pipeline::PipelineConfig;

/// Extracts, translates, and re-injects text in RPG Maker XP/VX/VX
/// Ace/MV/MZ project files.
#[ derive( Parser, Debug ) ]
#[ command( author, version, about ) ]
pub struct CmdOpts {
    /// Path to the RPG Maker project directory.
    pub project_dir: PathBuf,

    /// Source language tag, passed through verbatim to the translator.
    #[ arg( long, env = "RPLOCALIZE_SOURCE_LANG", default_value = "ja" ) ]
    pub source_lang: String,

    /// Target language tag, passed through verbatim to the translator.
    #[ arg( long, env = "RPLOCALIZE_TARGET_LANG", default_value = "en" ) ]
    pub target_lang: String,

    /// Item-count ceiling for one merged translation batch.
    #[ arg( long, env = "RPLOCALIZE_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE ) ]
    pub batch_size: usize,

    /// Character ceiling for one merged translation batch.
    #[ arg( long, env = "RPLOCALIZE_BATCH_CHARS", default_value_t = MERGE_MAX_SAFE_CHARS ) ]
    pub batch_chars: usize,

    /// Maximum number of translation batches in flight at once.
    #[ arg( long, env = "RPLOCALIZE_CONCURRENCY", default_value_t = 4 ) ]
    pub concurrency: usize,

    /// Also translate database `note` fields.
    #[ arg( long, env = "RPLOCALIZE_TRANSLATE_NOTES" ) ]
    pub translate_notes: bool,

    /// Also translate event-command comments.
    #[ arg( long, env = "RPLOCALIZE_TRANSLATE_COMMENTS" ) ]
    pub translate_comments: bool,

    /// Run extraction, merging, and translation, but skip writing.
    #[ arg( long ) ]
    pub dry_run: bool,

    /// Where to keep a backup of every file before it is overwritten.
    #[ arg( long, env = "RPLOCALIZE_BACKUP_DIR" ) ]
    pub backup_dir: Option<PathBuf>,

    /// Worker-thread count for file discovery/extraction/writing.
    #[ arg( long, env = "RPLOCALIZE_WORKER_THREADS", default_value_t = default_worker_threads() ) ]
    pub worker_threads: usize,

    /// Increase log verbosity (stacks: `-v`, `-vv`).
    #[ arg( short, long, action = clap::ArgAction::Count ) ]
    pub verbose: u8,
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism().map_or( 4, |n| n.get().min( 8 ) )
}

impl CmdOpts {
    /// Build the [`PipelineConfig`] this run should use, resolving the
    /// default backup directory relative to `project_dir`.
    #[ must_use ]
    pub fn to_pipeline_config( &self ) -> PipelineConfig {
        let backup_dir = self.backup_dir.clone()
            .unwrap_or_else( || self.project_dir.join( ".rplocalize-backup" ) );

        PipelineConfig {
            project_dir: self.project_dir.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
            batch_size: self.batch_size,
            batch_chars: self.batch_chars,
            concurrency: self.concurrency,
            translate_notes: self.translate_notes,
            translate_comments: self.translate_comments,
            dry_run: self.dry_run,
            backup_dir,
            worker_threads: self.worker_threads,
        }
    }
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn defaults_resolve_backup_dir_under_project() {
        let opts = CmdOpts::parse_from( [ "rplocalize", "/tmp/game" ] );
        assert_eq!( opts.source_lang, "ja" );
        assert_eq!( opts.target_lang, "en" );
        assert_eq!( opts.batch_size, DEFAULT_BATCH_SIZE );
        assert!( !opts.translate_notes );

        let cfg = opts.to_pipeline_config();
        assert_eq!( cfg.backup_dir, PathBuf::from( "/tmp/game/.rplocalize-backup" ) );
    }

    #[ test ]
    fn explicit_backup_dir_overrides_default() {
        let opts = CmdOpts::parse_from( [ "rplocalize", "/tmp/game", "--backup-dir", "/tmp/backup" ] );
        let cfg = opts.to_pipeline_config();
        assert_eq!( cfg.backup_dir, PathBuf::from( "/tmp/backup" ) );
    }
}
