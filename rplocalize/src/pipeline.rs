//! Pipeline orchestrator: discover project files, extract translatable
//! text, merge it into batches, hand batches to a [`Translator`],
//! split/restore/validate the results, retry whatever didn't validate,
//! inject translations back into each file, and write everything
//! atomically. Per-file work runs on a `rayon` worker pool; the
//! translator/cache/backup collaborators are `async_trait`-based,
//! matching the provider pattern used for pluggable translation
//! backends elsewhere in this ecosystem.

use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use rayon::prelude::*;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::error::{ CoreError, PipelineError };
use crate::json_core::{ self, ExtractConfig, ExtractedText };
use crate::merger::{ self, FileEntry, MergeEntry, MergedRequest, RequestMetadata };
use crate::placeholder;
use crate::ruby;

const DATA_DIR_NAMES: &[ &str ] = &[ "Data", "data", "www/data" ];
const JSON_EXTENSIONS: &[ &str ] = &[ "json", "js" ];
const MARSHAL_EXTENSIONS: &[ &str ] = &[ "rvdata2", "rxdata", "rvdata" ];
const MAX_RETRIES: u32 = 1;


/// Tunable knobs for one pipeline run (— all threaded through
/// the constructor, nothing global).
#[ derive( Debug, Clone ) ]
pub struct PipelineConfig {
    pub project_dir: PathBuf,
    pub source_lang: String,
    pub target_lang: String,
    pub batch_size: usize,
    pub batch_chars: usize,
    pub concurrency: usize,
    pub translate_notes: bool,
    pub translate_comments: bool,
    pub dry_run: bool,
    pub backup_dir: PathBuf,
    pub worker_threads: usize,
}

impl PipelineConfig {
    fn extract_config( &self ) -> ExtractConfig {
        ExtractConfig { translate_notes: self.translate_notes, translate_comments: self.translate_comments }
    }
}


/// One file discovered under the project, tagged with how it must be
/// parsed/injected.
#[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
enum FileKind {
    Json,
    Marshal,
}

fn classify( path: &Path ) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if JSON_EXTENSIONS.contains( &ext.as_str() ) {
        Some( FileKind::Json )
    } else if MARSHAL_EXTENSIONS.contains( &ext.as_str() ) {
        Some( FileKind::Marshal )
    } else {
        None
    }
}

/// Walk the project directory for every file the extractors can act
/// on: JSON/Marshal database files under a data directory, MV's
/// `js/plugins.js`, and any `locales/*.json` bundle.
#[ tracing::instrument( skip( project_dir ) ) ]
fn discover_files( project_dir: &Path ) -> Result<Vec<PathBuf>, PipelineError> {
    if !project_dir.is_dir() {
        return Err( PipelineError::InvalidProjectDir( project_dir.display().to_string() ) );
    }

    let mut files = Vec::new();

    for entry in WalkDir::new( project_dir ) {
        let entry = entry.map_err( |e| PipelineError::Discovery( e.to_string() ) )?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix( project_dir ).unwrap_or( path );
        let relative_str = relative.to_string_lossy().replace( '\\', "/" );

        let is_plugins_js = relative_str.eq_ignore_ascii_case( "js/plugins.js" );
        let is_locale = relative_str.to_lowercase().starts_with( "locales/" ) && classify( path ) == Some( FileKind::Json );
        let under_data_dir = DATA_DIR_NAMES.iter()
            .any( |d| relative_str.starts_with( &format!( "{d}/" ) ) || relative_str.eq_ignore_ascii_case( d ) );

        if is_plugins_js || is_locale || ( under_data_dir && classify( path ).is_some() ) {
            files.push( path.to_path_buf() );
        }
    }

    Ok( files )
}


/// What one discovered file contributed to the batch pipeline: its
/// extracted strings and the kind needed to parse/inject it.
struct DiscoveredFile {
    path: PathBuf,
    kind: FileKind,
    raw: Vec<u8>,
    extracted: Vec<ExtractedText>,
}

/// Read and extract every discovered file in parallel, bounded by
/// `rayon`'s global thread pool.
#[ tracing::instrument( skip( files, cfg ) ) ]
fn extract_all( files: &[ PathBuf ], cfg: &PipelineConfig ) -> Vec<DiscoveredFile> {
    files.par_iter()
        .filter_map( |path| {
            let kind = classify( path )?;
            let raw = std::fs::read( path ).map_err( |e| {
                tracing::warn!( ?path, error = %e, "failed to read file, skipping" );
            } ).ok()?;

            let extracted = match kind {
                FileKind::Json => {
                    let text = String::from_utf8_lossy( &raw ).into_owned();
                    json_core::extract_text( &path.display().to_string(), &text, &cfg.extract_config() )
                        .unwrap_or_else( |e| {
                            tracing::warn!( ?path, error = %e, "json extraction failed, skipping" );
                            Vec::new()
                        } )
                }
                FileKind::Marshal => {
                    match ruby::load( &raw ) {
                        Ok( tree ) => ruby::extract( &tree, &cfg.extract_config() ),
                        Err( e ) => {
                            tracing::warn!( ?path, error = %e, "marshal load failed, skipping" );
                            Vec::new()
                        }
                    }
                }
            };

            Some( DiscoveredFile { path: path.clone(), kind, raw, extracted } )
        } )
        .collect()
}


/// One fully-resolved translation destined for injection: the file it
/// belongs to, its path within that file, the original source text
/// (cache key), and the final translated text.
#[ derive( Debug, Clone ) ]
pub struct ResolvedTranslation {
    pub file: String,
    pub path: String,
    pub source_text: String,
    pub text: String,
}

/// One translated request, reassembled with enough of its originating
/// [`MergedRequest`] to split/restore/retry it.
struct Outcome {
    file: String,
    key: String,
    is_merged: bool,
    original_text: String,
    translated_text: String,
    success: bool,
}


/// Translator collaborator contract. Implementations batch
/// external calls however they like; the pipeline only ever awaits
/// `translate_batch` once per bounded chunk of pending requests.
#[ async_trait ]
pub trait Translator: Send + Sync {
    async fn translate_batch( &self, requests: &[ MergedRequest ] ) -> Vec<TranslationOutcome>;
}

/// Per-request result a [`Translator`] hands back, in the same order
/// as the requests it was given.
#[ derive( Debug, Clone ) ]
pub struct TranslationOutcome {
    pub translated_text: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Translation memory collaborator: consulted before a
/// request is sent, populated after a successful translation.
#[ async_trait ]
pub trait Cache: Send + Sync {
    async fn get( &self, source_lang: &str, target_lang: &str, text: &str ) -> Option<String>;
    async fn put( &self, source_lang: &str, target_lang: &str, text: &str, translated: &str );
}

/// Glossary collaborator: a pre-seeded translation that
/// bypasses the external translator entirely when it matches.
pub trait Glossary: Send + Sync {
    fn lookup( &self, source_lang: &str, target_lang: &str, text: &str ) -> Option<String>;
}

/// Backup collaborator: snapshots a file's original bytes
/// before it is overwritten.
pub trait Backup: Send + Sync {
    fn snapshot( &self, original_path: &Path, content: &[ u8 ] ) -> std::io::Result<()>;
}

/// Default [`Backup`] that copies each file into `backup_dir`,
/// mirroring its path relative to the project directory.
pub struct FilesystemBackup {
    pub project_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl Backup for FilesystemBackup {
    #[ tracing::instrument( skip( self, content ) ) ]
    fn snapshot( &self, original_path: &Path, content: &[ u8 ] ) -> std::io::Result<()> {
        let relative = original_path.strip_prefix( &self.project_dir ).unwrap_or( original_path );
        let dest = self.backup_dir.join( relative );
        if let Some( parent ) = dest.parent() {
            std::fs::create_dir_all( parent )?;
        }
        if dest.exists() {
            return Ok( () );
        }
        std::fs::write( dest, content )
    }
}


/// Run the full discover -> extract -> merge -> translate ->
/// split/restore/validate -> retry -> inject -> write pipeline.
///
/// `cancel`, if given, is polled between retry rounds and before the
/// final write phase; an in-flight translator batch always completes
/// since no writes happen until a whole batch's results are resolved
/// (cancellation model).
#[ tracing::instrument( skip( cfg, translator, cache, glossary, backup, cancel ) ) ]
pub async fn run(
    cfg: &PipelineConfig,
    translator: Arc<dyn Translator>,
    cache: Option<Arc<dyn Cache>>,
    glossary: Option<Arc<dyn Glossary>>,
    backup: Option<Arc<dyn Backup>>,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<usize, CoreError> {
    let files = discover_files( &cfg.project_dir )?;
    tracing::info!( count = files.len(), "discovered project files" );

    let discovered = extract_all( &files, cfg );

    // Cache/glossary are consulted per extracted item, keyed on the raw
    // source text before protection (Cache collaborator), not
    // on the merged/protected batch text a request ends up carrying.
    // Only misses are protected and handed to the merger; hits resolve
    // immediately without ever touching the translator.
    let mut protections: HashMap<( String, String ), ( String, placeholder::PlaceholderMap )> = HashMap::new();
    let mut file_entries: Vec<FileEntry> = Vec::new();
    let mut resolved: Vec<ResolvedTranslation> = Vec::new();

    for f in &discovered {
        let file = f.path.display().to_string();
        for e in &f.extracted {
            let hit = match &glossary {
                Some( g ) => g.lookup( &cfg.source_lang, &cfg.target_lang, &e.text ),
                None => None,
            };
            let hit = match hit {
                Some( h ) => Some( h ),
                None => match &cache {
                    Some( c ) => c.get( &cfg.source_lang, &cfg.target_lang, &e.text ).await,
                    None => None,
                },
            };

            if let Some( translated ) = hit {
                resolved.push( ResolvedTranslation {
                    file: file.clone(), path: e.path.clone(), source_text: e.text.clone(), text: translated,
                } );
                continue;
            }

            let ( protected_text, map ) = placeholder::protect( &e.text );
            file_entries.push( FileEntry {
                file: file.clone(),
                path: e.path.clone(),
                text: protected_text,
                context: format!( "{:?}", e.context ),
            } );
            protections.insert( ( file.clone(), e.path.clone() ), ( e.text.clone(), map ) );
        }
    }

    let cache_hit_count = resolved.len();

    let ( requests, merged_map ) = merger::create_merged_requests( &file_entries, cfg.batch_size, cfg.batch_chars );
    tracing::info!( requests = requests.len(), merged_groups = merged_map.len(), "built translation batches" );

    let mut pending = requests;
    let mut attempt = 0;

    while !pending.is_empty() && attempt <= MAX_RETRIES {
        if cancel.as_ref().is_some_and( |c| c.load( Ordering::Relaxed ) ) {
            tracing::info!( "cancellation requested, stopping before next retry round" );
            break;
        }

        let outcomes = translate_requests( cfg, translator.clone(), &pending ).await;

        let mut retry_batch = Vec::new();

        for outcome in outcomes {
            let batch_originals: Option<&[ MergeEntry ]> = if outcome.is_merged {
                merged_map.get( &format!( "{}::{}", outcome.file, outcome.key ) ).map( Vec::as_slice )
            } else {
                None
            };

            match batch_originals {
                Some( originals ) => resolve_merged( &outcome, originals, &protections, &mut resolved, &mut retry_batch, attempt ),
                None => resolve_single( &outcome, &protections, &mut resolved, &mut retry_batch, attempt ),
            }
        }

        pending = retry_batch;
        attempt += 1;
    }

    if !pending.is_empty() {
        tracing::warn!( count = pending.len(), "requests exhausted retries, reverting to original text" );
        for request in &pending {
            let source_text = protections.get( &( request.metadata.file.clone(), request.metadata.key.clone() ) )
                .map_or_else( || request.text.clone(), |( raw, _ )| raw.clone() );
            resolved.push( ResolvedTranslation {
                file: request.metadata.file.clone(),
                path: request.metadata.key.clone(),
                source_text: source_text.clone(),
                text: source_text,
            } );
        }
    }

    if let Some( cache ) = &cache {
        for r in &resolved[ cache_hit_count.. ] {
            cache.put( &cfg.source_lang, &cfg.target_lang, &r.source_text, &r.text ).await;
        }
    }

    let written = inject_and_write( cfg, &discovered, &resolved, backup.as_deref() )?;
    Ok( written )
}

type Protections = HashMap<( String, String ), ( String, placeholder::PlaceholderMap )>;

fn resolve_merged(
    outcome: &Outcome,
    originals: &[ MergeEntry ],
    protections: &Protections,
    resolved: &mut Vec<ResolvedTranslation>,
    retry_batch: &mut Vec<MergedRequest>,
    attempt: u32,
) {
    let Ok( split ) = merger::split_merged_result( &outcome.translated_text, originals ) else { return };

    if split.mismatch && attempt < MAX_RETRIES {
        for entry in originals {
            retry_batch.push( MergedRequest {
                text: entry.text.clone(),
                metadata: RequestMetadata {
                    description: entry.context.clone(), key: entry.key.clone(),
                    is_merged: false, file: outcome.file.clone(),
                },
            } );
        }
        return;
    }

    for ( key, text ) in split.pairs {
        let restored = restore_and_validate( protections, &outcome.file, &key, &text );
        let source_text = protections.get( &( outcome.file.clone(), key.clone() ) )
            .map_or_else( String::new, |( raw, _ )| raw.clone() );
        resolved.push( ResolvedTranslation { file: outcome.file.clone(), path: key, source_text, text: restored } );
    }
}

fn resolve_single(
    outcome: &Outcome,
    protections: &Protections,
    resolved: &mut Vec<ResolvedTranslation>,
    retry_batch: &mut Vec<MergedRequest>,
    attempt: u32,
) {
    if !outcome.success && attempt < MAX_RETRIES {
        retry_batch.push( MergedRequest {
            text: outcome.original_text.clone(),
            metadata: RequestMetadata {
                description: String::new(), key: outcome.key.clone(),
                is_merged: false, file: outcome.file.clone(),
            },
        } );
        return;
    }

    let source_text = protections.get( &( outcome.file.clone(), outcome.key.clone() ) )
        .map_or_else( || outcome.original_text.clone(), |( raw, _ )| raw.clone() );
    let text = if outcome.success {
        restore_and_validate( protections, &outcome.file, &outcome.key, &outcome.translated_text )
    } else {
        source_text.clone()
    };
    resolved.push( ResolvedTranslation {
        file: outcome.file.clone(), path: outcome.key.clone(), source_text, text,
    } );
}

/// Restore placeholders in a translated fragment using the exact map
/// built when its source text was first protected (§4.2), validate the
/// restoration, and fall back to the last-ditch prefix/suffix repair on
/// failure.
fn restore_and_validate( protections: &Protections, file: &str, key: &str, translated: &str ) -> String {
    let Some( ( raw, map ) ) = protections.get( &( file.to_string(), key.to_string() ) ) else {
        return translated.to_string();
    };
    if map.is_empty() {
        return translated.to_string();
    }

    let restored = placeholder::restore( translated, map );
    let ( ok, missing ) = placeholder::validate_restoration( raw, &restored, map );
    if ok {
        restored
    } else {
        placeholder::repair_missing_tokens( raw, &restored, &missing )
    }
}

/// Hand every request to the translator in chunks run concurrently
/// under a semaphore sized by [`PipelineConfig::concurrency`] (spec
/// §5). Cache/glossary hits are already filtered out before a request
/// ever reaches here (see [`run`]).
async fn translate_requests(
    cfg: &PipelineConfig,
    translator: Arc<dyn Translator>,
    requests: &[ MergedRequest ],
) -> Vec<Outcome> {
    if requests.is_empty() {
        return Vec::new();
    }

    let chunk_count = cfg.concurrency.max( 1 ).min( requests.len() );
    let chunk_size = requests.len().div_ceil( chunk_count );
    let semaphore = Arc::new( Semaphore::new( cfg.concurrency.max( 1 ) ) );
    let mut handles = Vec::new();

    let chunks = requests.iter().cloned().chunks( chunk_size );
    let chunks = chunks.into_iter().map( Itertools::collect_vec ).collect_vec();

    for chunk in chunks {
        let translator = translator.clone();
        let semaphore = semaphore.clone();
        handles.push( tokio::spawn( async move {
            let _permit = semaphore.acquire().await.expect( "semaphore not closed" );
            let outcomes = translator.translate_batch( &chunk ).await;
            chunk.into_iter().zip( outcomes ).collect::<Vec<_>>()
        } ) );
    }

    let mut translated = Vec::new();
    for handle in handles {
        if let Ok( pairs ) = handle.await {
            translated.extend( pairs );
        }
    }

    translated.into_iter()
        .map( |( request, translation )| Outcome {
            file: request.metadata.file.clone(), key: request.metadata.key.clone(),
            is_merged: request.metadata.is_merged, original_text: request.text.clone(),
            translated_text: translation.translated_text, success: translation.success,
        } )
        .collect()
}

fn inject_and_write(
    cfg: &PipelineConfig,
    discovered: &[ DiscoveredFile ],
    resolved: &[ ResolvedTranslation ],
    backup: Option<&dyn Backup>,
) -> Result<usize, CoreError> {
    let mut by_file: HashMap<&str, HashMap<String, String>> = HashMap::new();
    for r in resolved {
        if r.text.is_empty() {
            continue;
        }
        by_file.entry( r.file.as_str() ).or_default().insert( r.path.clone(), r.text.clone() );
    }

    let mut written = 0;

    for file in discovered {
        let key = file.path.display().to_string();
        let Some( translations ) = by_file.get( key.as_str() ) else { continue };
        if translations.is_empty() {
            continue;
        }

        let new_bytes = match file.kind {
            FileKind::Json => {
                let content = String::from_utf8_lossy( &file.raw ).into_owned();
                json_core::inject_translations( &key, &content, translations )?.into_bytes()
            }
            FileKind::Marshal => {
                let mut tree = ruby::load( &file.raw )?;
                ruby::inject( &mut tree, translations );
                ruby::dump( &tree )?
            }
        };

        if cfg.dry_run {
            tracing::info!( path = %key, "dry run, not writing" );
            continue;
        }

        if let Some( b ) = backup {
            b.snapshot( &file.path, &file.raw )?;
        }

        atomic_write( &file.path, &new_bytes )?;
        written += 1;
    }

    Ok( written )
}

/// Write `content` to `path` via a temp file in the same directory,
/// then rename over the original so a crash never leaves a
/// half-written game file.
#[ tracing::instrument( skip( content ) ) ]
fn atomic_write( path: &Path, content: &[ u8 ] ) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else( || Path::new( "." ) );
    let mut tmp = tempfile::NamedTempFile::new_in( dir )?;
    std::io::Write::write_all( &mut tmp, content )?;
    tmp.persist( path ).map_err( |e| e.error )?;
    Ok( () )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    struct EchoTranslator;

    #[ async_trait ]
    impl Translator for EchoTranslator {
        async fn translate_batch( &self, requests: &[ MergedRequest ] ) -> Vec<TranslationOutcome> {
            requests.iter()
                .map( |r| TranslationOutcome { translated_text: r.text.to_uppercase(), success: true, error: None } )
                .collect()
        }
    }

    fn base_config( project_dir: PathBuf ) -> PipelineConfig {
        PipelineConfig {
            project_dir: project_dir.clone(),
            source_lang: "ja".into(),
            target_lang: "en".into(),
            batch_size: 20,
            batch_chars: 4000,
            concurrency: 4,
            translate_notes: false,
            translate_comments: false,
            dry_run: false,
            backup_dir: project_dir.join( ".rplocalize-backup" ),
            worker_threads: 2,
        }
    }

    #[ test ]
    fn classify_recognizes_json_and_marshal_extensions() {
        assert_eq!( classify( Path::new( "Map001.json" ) ), Some( FileKind::Json ) );
        assert_eq!( classify( Path::new( "Scripts.rvdata2" ) ), Some( FileKind::Marshal ) );
        assert_eq!( classify( Path::new( "js/plugins.js" ) ), Some( FileKind::Json ) );
        assert_eq!( classify( Path::new( "CharSet.png" ) ), None );
    }

    #[ tokio::test ]
    async fn full_pipeline_round_trip_on_plugins_js() {
        let dir = assert_fs::TempDir::new().unwrap();
        let js_dir = dir.path().join( "js" );
        std::fs::create_dir_all( &js_dir ).unwrap();
        std::fs::write(
            js_dir.join( "plugins.js" ),
            r#"var $plugins = [{"name":"Demo","status":true,"parameters":{"greeting":"Hello there"}}];"#,
        ).unwrap();

        let cfg = base_config( dir.path().to_path_buf() );
        let translator: Arc<dyn Translator> = Arc::new( EchoTranslator );
        let written = run( &cfg, translator, None, None, None, None ).await.unwrap();
        assert_eq!( written, 1 );

        let rewritten = std::fs::read_to_string( js_dir.join( "plugins.js" ) ).unwrap();
        assert!( rewritten.starts_with( "var $plugins = " ) );
        assert!( rewritten.contains( "HELLO THERE" ) );
    }

    #[ test ]
    fn discover_files_finds_data_dir_and_plugins_js() {
        let dir = assert_fs::TempDir::new().unwrap();
        let data = dir.path().join( "data" );
        std::fs::create_dir_all( &data ).unwrap();
        std::fs::write( data.join( "Map001.json" ), "{}" ).unwrap();

        let js_dir = dir.path().join( "js" );
        std::fs::create_dir_all( &js_dir ).unwrap();
        std::fs::write( js_dir.join( "plugins.js" ), "var $plugins = [];" ).unwrap();

        let found = discover_files( dir.path() ).unwrap();
        assert_eq!( found.len(), 2 );
    }

    #[ tokio::test ]
    async fn full_pipeline_round_trip_on_json_project() {
        let dir = assert_fs::TempDir::new().unwrap();
        let data = dir.path().join( "data" );
        std::fs::create_dir_all( &data ).unwrap();
        std::fs::write(
            data.join( "Map001.json" ),
            r#"{"events":[{"name":"ev1","pages":[{"list":[{"code":401,"parameters":["Hello there"]}]}]}]}"#,
        ).unwrap();

        let cfg = base_config( dir.path().to_path_buf() );
        let translator: Arc<dyn Translator> = Arc::new( EchoTranslator );
        let written = run( &cfg, translator, None, None, None, None ).await.unwrap();
        assert_eq!( written, 1 );

        let rewritten = std::fs::read_to_string( data.join( "Map001.json" ) ).unwrap();
        assert!( rewritten.contains( "HELLO THERE" ) );
    }

    #[ tokio::test ]
    async fn cache_is_populated_with_source_text_not_path() {
        use std::sync::Mutex;

        struct RecordingCache {
            puts: Mutex<Vec<( String, String )>>,
        }

        #[ async_trait ]
        impl Cache for RecordingCache {
            async fn get( &self, _source_lang: &str, _target_lang: &str, _text: &str ) -> Option<String> {
                None
            }
            async fn put( &self, _source_lang: &str, _target_lang: &str, text: &str, translated: &str ) {
                self.puts.lock().unwrap().push( ( text.to_string(), translated.to_string() ) );
            }
        }

        let dir = assert_fs::TempDir::new().unwrap();
        let data = dir.path().join( "data" );
        std::fs::create_dir_all( &data ).unwrap();
        std::fs::write(
            data.join( "Map001.json" ),
            r#"{"events":[{"name":"ev1","pages":[{"list":[{"code":401,"parameters":["Hello there"]}]}]}]}"#,
        ).unwrap();

        let cfg = base_config( dir.path().to_path_buf() );
        let translator: Arc<dyn Translator> = Arc::new( EchoTranslator );
        let cache = Arc::new( RecordingCache { puts: Mutex::new( Vec::new() ) } );

        run( &cfg, translator, Some( cache.clone() ), None, None, None ).await.unwrap();

        let puts = cache.puts.lock().unwrap();
        assert!( puts.iter().any( |( source, translated )|
            source == "Hello there" && translated == "HELLO THERE"
        ), "expected cache to be keyed by the original source text, got {puts:?}" );
    }

    #[ test ]
    fn filesystem_backup_writes_once() {
        let dir = assert_fs::TempDir::new().unwrap();
        let project = dir.path().join( "proj" );
        std::fs::create_dir_all( &project ).unwrap();
        let file = project.join( "Map001.json" );
        std::fs::write( &file, "{}" ).unwrap();

        let backup = FilesystemBackup { project_dir: project.clone(), backup_dir: dir.path().join( "backup" ) };
        backup.snapshot( &file, b"{}" ).unwrap();
        assert!( dir.path().join( "backup" ).join( "Map001.json" ).exists() );
    }
}
