//! Text merger: batches many short extracted strings into
//! fewer translation requests, then splits the translated blocks back
//! apart. Grounded on
//! `original_source/src/core/text_merger.py` (`TextMerger`).

use std::collections::HashMap;

use regex::Regex;
use std::sync::LazyLock;

use crate::error::MergeError;
use crate::lore::{ DEFAULT_BATCH_SIZE, LINE_BREAK_TOKEN, MERGE_MAX_SAFE_CHARS, MERGE_OVERHEAD_PER_ITEM };


/// One not-yet-merged extraction: its merge key, text, and a free-form
/// context label used in merged-batch descriptions.
#[ derive( Debug, Clone ) ]
pub struct MergeEntry {
    pub key: String,
    pub text: String,
    pub context: String,
}

/// Metadata carried alongside a translation request so the caller can
/// thread it back through an external translator untouched.
#[ derive( Debug, Clone ) ]
pub struct RequestMetadata {
    pub description: String,
    pub key: String,
    pub is_merged: bool,
    pub file: String,
}

/// A text block ready to hand to a translator.
#[ derive( Debug, Clone ) ]
pub struct MergedRequest {
    pub text: String,
    pub metadata: RequestMetadata,
}

/// Batches accumulated by one [`TextMerger`] run, keyed so a later
/// split can look the original entries back up.
pub type MergedMap = HashMap<String, Vec<MergeEntry>>;


/// Accumulates [`MergeEntry`] values into [`MergedRequest`] blocks
/// under an item-count and a character-ceiling trigger.
pub struct TextMerger {
    batch_size: usize,
    max_safe_chars: usize,
    current_block: Vec<MergeEntry>,
    merged_requests: Vec<MergedRequest>,
    original_entries: HashMap<String, Vec<MergeEntry>>,
}

impl Default for TextMerger {
    fn default() -> Self {
        Self::new( DEFAULT_BATCH_SIZE )
    }
}

impl TextMerger {
    #[ must_use ]
    pub fn new( batch_size: usize ) -> Self {
        Self::with_limits( batch_size, MERGE_MAX_SAFE_CHARS )
    }

    #[ must_use ]
    pub fn with_limits( batch_size: usize, max_safe_chars: usize ) -> Self {
        Self {
            batch_size,
            max_safe_chars,
            current_block: Vec::new(),
            merged_requests: Vec::new(),
            original_entries: HashMap::new(),
        }
    }

    /// Add one entry, flushing the current block first if it would
    /// overflow the item count or the character ceiling.
    #[ tracing::instrument( skip( self, text ), fields( key ) ) ]
    pub fn add( &mut self, key: &str, text: &str, context: &str ) {
        if text.trim().is_empty() {
            return;
        }

        let current_chars: usize = self.current_block.iter().map( |e| e.text.chars().count() ).sum();
        let separator_overhead = ( self.current_block.len() + 1 ) * MERGE_OVERHEAD_PER_ITEM;
        let predicted = current_chars + text.chars().count() + separator_overhead;

        if self.current_block.len() >= self.batch_size || predicted > self.max_safe_chars {
            self.flush_block();
        }

        self.current_block.push( MergeEntry { key: key.to_string(), text: text.to_string(), context: context.to_string() } );
    }

    /// Finalize the current block into a [`MergedRequest`], if non-empty.
    #[ tracing::instrument( skip( self ) ) ]
    pub fn flush_block( &mut self ) {
        if self.current_block.is_empty() {
            return;
        }

        if self.current_block.len() == 1 {
            let entry = self.current_block.remove( 0 );
            self.merged_requests.push( MergedRequest {
                text: entry.text.clone(),
                metadata: RequestMetadata {
                    description: entry.context.clone(),
                    key: entry.key.clone(),
                    is_merged: false,
                    file: String::new(),
                },
            } );
            return;
        }

        let block = std::mem::take( &mut self.current_block );
        let merged_text = block.iter().map( |e| e.text.as_str() )
            .collect::<Vec<_>>()
            .join( &format!( "\n{LINE_BREAK_TOKEN}\n" ) );

        let first = block[ 0 ].clone();
        let description = format!( "Merged Batch ({} items) - Start: {}", block.len(), first.context );
        let key = first.key.clone();

        self.original_entries.insert( key.clone(), block );
        self.merged_requests.push( MergedRequest {
            text: merged_text,
            metadata: RequestMetadata { description, key, is_merged: true, file: String::new() },
        } );
    }

    /// Flush any remainder and return every accumulated request.
    #[ tracing::instrument( skip( self ) ) ]
    pub fn take_requests( &mut self ) -> Vec<MergedRequest> {
        self.flush_block();
        std::mem::take( &mut self.merged_requests )
    }

    /// The original entries behind a merged request's key, if it was
    /// in fact a multi-entry merge.
    #[ must_use ]
    pub fn original_entries( &self, key: &str ) -> Option<&[ MergeEntry ]> {
        self.original_entries.get( key ).map( Vec::as_slice )
    }

    pub fn reset( &mut self ) {
        self.current_block.clear();
        self.merged_requests.clear();
        self.original_entries.clear();
    }
}


/// Outcome of splitting a translated merged block back into its
/// constituent lines.
#[ derive( Debug, Clone ) ]
pub struct SplitOutcome {
    pub pairs: Vec<( String, String )>,
    pub mismatch: bool,
}

/// Split a translated block back into `(key, line)` pairs. On a count
/// mismatch, lines are assigned positionally and any entry with no
/// corresponding line falls back to its original text (spec §4.7
/// mismatch policy).
#[ tracing::instrument( skip( merged_text, original_entries ) ) ]
pub fn split_merged_result( merged_text: &str, original_entries: &[ MergeEntry ] ) -> Result<SplitOutcome, MergeError> {
    if original_entries.is_empty() {
        return Err( MergeError::EmptyBatch );
    }

    let expected = original_entries.len();
    let lines = split_lines( merged_text, expected );
    let mismatch = lines.len() != expected;

    let mut pairs = Vec::with_capacity( expected );
    for ( i, entry ) in original_entries.iter().enumerate() {
        let text = lines.get( i ).cloned().unwrap_or_else( || {
            tracing::error!( key = %entry.key, index = i, "missing translation line in merged block, reverting to original" );
            entry.text.clone()
        } );
        pairs.push( ( entry.key.clone(), text ) );
    }

    if mismatch {
        tracing::warn!( got = lines.len(), expected, path = %original_entries[ 0 ].key, "merge split mismatch" );
    }

    Ok( SplitOutcome { pairs, mismatch } )
}

fn split_lines( merged_text: &str, expected: usize ) -> Vec<String> {
    let normalized = normalize_line_break_tokens( merged_text );

    let mut lines: Vec<String> = if normalized.contains( LINE_BREAK_TOKEN ) {
        LINE_SPLIT_RE.split( &normalized ).map( str::to_string ).collect()
    } else if normalized.contains( "[[XRPYX_LB_XRPYX]]" ) {
        LEGACY_BRACKET_RE.split( &normalized ).map( str::to_string ).collect()
    } else {
        normalized.lines().map( str::to_string ).collect()
    };

    lines = lines.iter().map( |l| l.trim().to_string() ).collect();

    if lines.len() > expected && lines.last().is_some_and( |l| l.is_empty() ) {
        lines.truncate( expected );
    }

    lines
}

static LINE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"(?i)\s*\|\|\|\s*XLB\s*\|\|\|\s*" ).expect( "static regex" ) );
static LEGACY_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"\s*\[\[XRPYX_LB_XRPYX\]\]\s*" ).expect( "static regex" ) );
static SPACED_LETTERS_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"(?i)X\s*R\s*P\s*Y\s*X\s*L\s*B" ).expect( "static regex" ) );
static LONG_PIPE_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"(?i)\|{2,}\s*XRPYXLB\s*\|{2,}" ).expect( "static regex" ) );
static XML_LB_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"<\s*XRPYX_LB\s*>" ).expect( "static regex" ) );
static XML_LB_SPACED_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"(?i)<\s*X\s*R\s*P\s*Y\s*X\s*_?\s*L\s*B\s*>" ).expect( "static regex" ) );
static CURRENT_SPACING_RE: LazyLock<Regex> =
    LazyLock::new( || Regex::new( r"(?i)\|{2,}\s*XLB\s*\|{2,}" ).expect( "static regex" ) );

/// Tolerates degraded line-break tokens a translator may return:
/// spaced-out letters, legacy bracket/XML variants, and inconsistent
/// pipe spacing, normalizing everything to [`LINE_BREAK_TOKEN`].
#[ tracing::instrument( skip( text ) ) ]
fn normalize_line_break_tokens( text: &str ) -> String {
    if text.is_empty() {
        return text.to_string();
    }

    let mut normalized = text.replace( "[[XRPYX_LB_XRPYX]]", LINE_BREAK_TOKEN );
    normalized = SPACED_LETTERS_RE.replace_all( &normalized, "XRPYXLB" ).into_owned();

    if normalized.contains( "XRPYXLB" ) {
        normalized = LONG_PIPE_RE.replace_all( &normalized, LINE_BREAK_TOKEN ).into_owned();
        normalized = normalized.replace( "XRPYXLB", LINE_BREAK_TOKEN );
    }

    normalized = XML_LB_RE.replace_all( &normalized, LINE_BREAK_TOKEN ).into_owned();
    normalized = XML_LB_SPACED_RE.replace_all( &normalized, LINE_BREAK_TOKEN ).into_owned();
    normalized = CURRENT_SPACING_RE.replace_all( &normalized, LINE_BREAK_TOKEN ).into_owned();

    normalized
}


/// One extraction result, prior to merging: its source file, path,
/// text, and context tag.
#[ derive( Debug, Clone ) ]
pub struct FileEntry {
    pub file: String,
    pub path: String,
    pub text: String,
    pub context: String,
}

/// Group entries by file, batch each file's entries independently,
/// and return the flat request list plus a lookup from
/// `"<file>::<key>"` to the original entries behind any merged batch
/// (`create_merged_requests`).
#[ tracing::instrument( skip( entries ) ) ]
pub fn create_merged_requests(
    entries: &[ FileEntry ],
    batch_size: usize,
    batch_chars: usize,
) -> ( Vec<MergedRequest>, HashMap<String, Vec<MergeEntry>> ) {
    if entries.is_empty() {
        return ( Vec::new(), HashMap::new() );
    }

    let mut file_order: Vec<String> = Vec::new();
    let mut file_groups: HashMap<String, Vec<&FileEntry>> = HashMap::new();
    for entry in entries {
        file_groups.entry( entry.file.clone() ).or_insert_with( || {
            file_order.push( entry.file.clone() );
            Vec::new()
        } ).push( entry );
    }

    let mut requests = Vec::new();
    let mut merged_map = HashMap::new();

    for file in file_order {
        let Some( file_entries ) = file_groups.get( &file ) else { continue };
        let mut merger = TextMerger::with_limits( batch_size, batch_chars );

        for entry in file_entries {
            merger.add( &entry.path, &entry.text, &entry.context );
        }

        for mut request in merger.take_requests() {
            request.metadata.file = file.clone();

            if request.metadata.is_merged {
                if let Some( originals ) = merger.original_entries( &request.metadata.key ) {
                    let lookup_key = format!( "{file}::{}", request.metadata.key );
                    merged_map.insert( lookup_key, originals.to_vec() );
                }
            }

            requests.push( request );
        }
    }

    ( requests, merged_map )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn single_entry_is_not_merged() {
        let mut merger = TextMerger::new( 20 );
        merger.add( "k1", "Hello", "dialogue" );
        let requests = merger.take_requests();
        assert_eq!( requests.len(), 1 );
        assert!( !requests[ 0 ].metadata.is_merged );
        assert_eq!( requests[ 0 ].text, "Hello" );
    }

    #[ test ]
    fn multiple_entries_merge_with_separator() {
        let mut merger = TextMerger::new( 20 );
        merger.add( "k1", "one", "dialogue" );
        merger.add( "k2", "two", "dialogue" );
        let requests = merger.take_requests();
        assert_eq!( requests.len(), 1 );
        assert!( requests[ 0 ].metadata.is_merged );
        assert_eq!( requests[ 0 ].text, format!( "one\n{LINE_BREAK_TOKEN}\ntwo" ) );
    }

    #[ test ]
    fn item_count_ceiling_flushes_block() {
        let mut merger = TextMerger::new( 2 );
        merger.add( "k1", "a", "" );
        merger.add( "k2", "b", "" );
        merger.add( "k3", "c", "" );
        let requests = merger.take_requests();
        assert_eq!( requests.len(), 2 );
    }

    #[ test ]
    fn char_ceiling_flushes_block() {
        let mut merger = TextMerger::new( 1000 );
        merger.add( "k1", &"x".repeat( 3900 ), "" );
        merger.add( "k2", &"y".repeat( 200 ), "" );
        let requests = merger.take_requests();
        assert_eq!( requests.len(), 2 );
    }

    #[ test ]
    fn split_merged_result_perfect_match() {
        let originals = vec![
            MergeEntry { key: "k1".into(), text: "one".into(), context: String::new() },
            MergeEntry { key: "k2".into(), text: "two".into(), context: String::new() },
        ];
        let translated = format!( "uno\n{LINE_BREAK_TOKEN}\ndos" );
        let outcome = split_merged_result( &translated, &originals ).unwrap();
        assert!( !outcome.mismatch );
        assert_eq!( outcome.pairs, vec![ ( "k1".to_string(), "uno".to_string() ), ( "k2".to_string(), "dos".to_string() ) ] );
    }

    #[ test ]
    fn split_merged_result_mismatch_falls_back_to_original() {
        let originals = vec![
            MergeEntry { key: "k1".into(), text: "one".into(), context: String::new() },
            MergeEntry { key: "k2".into(), text: "two".into(), context: String::new() },
        ];
        let translated = "uno solo";
        let outcome = split_merged_result( translated, &originals ).unwrap();
        assert!( outcome.mismatch );
        assert_eq!( outcome.pairs[ 0 ], ( "k1".to_string(), "uno solo".to_string() ) );
        assert_eq!( outcome.pairs[ 1 ], ( "k2".to_string(), "two".to_string() ) );
    }

    #[ test ]
    fn normalizes_spaced_letter_and_xml_degraded_tokens() {
        let originals = vec![
            MergeEntry { key: "k1".into(), text: "one".into(), context: String::new() },
            MergeEntry { key: "k2".into(), text: "two".into(), context: String::new() },
        ];
        let translated = "uno <XRPYX_LB> dos";
        let outcome = split_merged_result( translated, &originals ).unwrap();
        assert!( !outcome.mismatch );
        assert_eq!( outcome.pairs[ 0 ].1, "uno" );
        assert_eq!( outcome.pairs[ 1 ].1, "dos" );
    }

    #[ test ]
    fn create_merged_requests_groups_by_file_and_builds_merged_map() {
        let entries = vec![
            FileEntry { file: "a.json".into(), path: "p1".into(), text: "one".into(), context: String::new() },
            FileEntry { file: "a.json".into(), path: "p2".into(), text: "two".into(), context: String::new() },
            FileEntry { file: "b.json".into(), path: "p3".into(), text: "three".into(), context: String::new() },
        ];
        let ( requests, merged_map ) = create_merged_requests( &entries, 20, MERGE_MAX_SAFE_CHARS );
        assert_eq!( requests.len(), 2 );
        assert_eq!( merged_map.len(), 1 );
        assert!( merged_map.contains_key( "a.json::p1" ) );
    }
}
