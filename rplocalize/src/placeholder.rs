//! Placeholder protection layer.
//!
//! No prior art survives for this module: the original's
//! `utils/placeholder.py` is a stub (imports and a logger, nothing
//! else — confirmed empty by grepping the whole original tree for
//! `RLPH`). Everything below is built directly from the fragment grammar below
//! and its worked example (S6).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::lore::{ PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE, PLACEHOLDER_BODY };


/// Classifies a masked fragment, for debugging only — restoration
/// never depends on which kind a key claims to be.
#[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
pub enum Kind {
    /// RPG Maker escape codes and plugin escapes (`\V[1]`, `\FS[2]`, …).
    Cmd,
    /// Markup tags (`<br>`, `<color=red>`, …).
    Tag,
    /// Interpolated expressions (`#{...}`, `${...}`).
    Scpt,
    /// Meta-directives (`eval:`, `script:`, `note:`, `meta:`).
    Ext,
    /// Bracketed/braced variable placeholders (`[[...]]`, `{{...}}`).
    Var,
}

impl Kind {
    const fn tag( self ) -> &'static str {
        match self {
            Self::Cmd => "CMD",
            Self::Tag => "TAG",
            Self::Scpt => "SCPT",
            Self::Ext => "EXT",
            Self::Var => "VAR",
        }
    }
}


/// Per-text mapping from opaque key to original fragment, discarded
/// after a single restore call.
pub type PlaceholderMap = HashMap<String, String>;


fn escape_code_pattern() -> &'static str {
    concat!(
        r"(?i:\\V\[\d+\]|\\C\[\d+\]|\\N\[\d+\]|\\P\[\d+\]|\\I\[\d+\]",
        r"|\\FS\[\d+\]|\\FB\[\d+\]|\\FI\[\d+\]|\\PX\[\d+,\s*\d+\]|\\PY\[\d+\]",
        r"|\\MSGCore\[[^\]]*\]|\\pop\[[^\]]*\]|\\WordWrap\[[^\]]*\]",
        r"|\\G|\\\$|\\!|\\\||\\\.|\\>|\\<|\\\^|\\\{|\\\}|\\\\|\\\[|\\\])",
    )
}

static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( &format!(
        r"(?P<cmd>{cmd})|(?P<tag><[^<>\n]*>)|(?P<scpt>#\{{[^}}]*\}}|\$\{{[^}}]*\}})|(?P<var>\[\[[^\]]*\]\]|\{{\{{[^}}]*\}}\}})|(?P<ext>(?i:eval|script|note|meta):[^\n]*)",
        cmd = escape_code_pattern(),
    ) ).expect( "fragment pattern is valid" )
} );

/// Decorative codes whose loss after restoration is tolerated.
static DECORATIVE_RE: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( r"(?i)\\C\[\d+\]|\\I\[\d+\]" ).expect( "decorative pattern is valid" )
} );


/// Mask every recognized fragment in `s` with an opaque key, in
/// first-occurrence order. Text already containing placeholder
/// brackets is left untouched (never re-keyed).
#[ tracing::instrument( skip( s ) ) ]
pub fn protect( s: &str ) -> ( String, PlaceholderMap ) {
    let mut map = PlaceholderMap::new();
    let mut counters: HashMap<&'static str, usize> = HashMap::new();

    let protected = FRAGMENT_RE.replace_all( s, |caps: &regex::Captures| {
        let ( whole, kind ) = if let Some( m ) = caps.name( "cmd" ) {
            ( m.as_str(), Kind::Cmd )
        } else if let Some( m ) = caps.name( "tag" ) {
            ( m.as_str(), Kind::Tag )
        } else if let Some( m ) = caps.name( "scpt" ) {
            ( m.as_str(), Kind::Scpt )
        } else if let Some( m ) = caps.name( "var" ) {
            ( m.as_str(), Kind::Var )
        } else {
            let m = caps.name( "ext" ).expect( "one alternative always matches" );
            ( m.as_str(), Kind::Ext )
        };

        if whole.contains( PLACEHOLDER_OPEN ) {
            return whole.to_string();
        }

        let n = counters.entry( kind.tag() ).or_insert( 0 );
        let key = format!(
            "{PLACEHOLDER_OPEN}{PLACEHOLDER_BODY}{}{n}{PLACEHOLDER_CLOSE}",
            kind.tag(),
        );
        *n += 1;

        map.insert( key.clone(), whole.to_string() );
        key
    } );

    ( protected.into_owned(), map )
}


/// Three-phase restoration: exact, fuzzy, syntax polish.
#[ tracing::instrument( skip( s, map ) ) ]
pub fn restore( s: &str, map: &PlaceholderMap ) -> String {
    let exact = restore_exact( s, map );
    let fuzzy = restore_fuzzy( &exact, map );
    syntax_polish( &fuzzy )
}

fn restore_exact( s: &str, map: &PlaceholderMap ) -> String {
    let mut out = s.to_string();
    for ( key, original ) in map {
        out = out.replace( key.as_str(), original );
    }
    out
}

/// Builds a regex alternative tolerant to whitespace inserted inside
/// the key and to Cyrillic/Greek transliteration of its ASCII body,
/// for one specific kind tag (e.g. `"CMD"`) and index.
fn fuzzy_key_pattern( kind_tag: &str, n: &str ) -> String {
    let body_word = format!( "RLPH_{kind_tag}" );
    let loose_word: String = body_word.chars()
        .map( loose_letter_class )
        .collect::<Vec<_>>()
        .join( r"\s*" );
    format!(
        r"{}?\s*{loose_word}\s*{n}\s*{}?",
        regex::escape( &PLACEHOLDER_OPEN.to_string() ),
        regex::escape( &PLACEHOLDER_CLOSE.to_string() ),
    )
}

/// Character class tolerant to case and to known Cyrillic/Greek
/// look-alikes for one ASCII letter (or passes digits/underscore
/// through unchanged).
fn loose_letter_class( c: char ) -> String {
    let confusables: &[char] = match c.to_ascii_uppercase() {
        'A' => &[ 'A', 'a', '\u{0410}', '\u{0430}', '\u{0391}', '\u{03B1}' ],
        'C' => &[ 'C', 'c', '\u{0421}', '\u{0441}' ],
        'E' => &[ 'E', 'e', '\u{0415}', '\u{0435}', '\u{0395}' ],
        'H' => &[ 'H', 'h', '\u{041D}', '\u{0397}' ],
        'M' => &[ 'M', 'm', '\u{041C}', '\u{039C}' ],
        'P' => &[ 'P', 'p', '\u{0420}', '\u{0440}', '\u{03A1}', '\u{03C1}' ],
        'S' => &[ 'S', 's', '\u{0405}', '\u{0455}' ],
        'T' => &[ 'T', 't', '\u{0422}', '\u{03A4}' ],
        'X' => &[ 'X', 'x', '\u{0425}', '\u{0445}', '\u{03A7}', '\u{03C7}' ],
        '_' => return r"[\s_]*".to_string(),
        _ => return regex::escape( &c.to_string() ).chars()
            .flat_map( |c| [ c.to_ascii_lowercase(), c.to_ascii_uppercase() ] )
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .fold( String::from( "[" ), |mut acc, c| { acc.push( c ); acc } ) + "]",
    };
    let mut class = String::from( "[" );
    for c in confusables {
        class.push( *c );
    }
    class.push( ']' );
    class
}

fn restore_fuzzy( s: &str, map: &PlaceholderMap ) -> String {
    let mut out = s.to_string();

    for ( key, original ) in map {
        // key looks like "⟦RLPH_CMD0⟧"; peel off kind tag and index.
        let Some( body ) = key
            .strip_prefix( PLACEHOLDER_OPEN )
            .and_then( |s| s.strip_suffix( PLACEHOLDER_CLOSE ) )
            .and_then( |s| s.strip_prefix( PLACEHOLDER_BODY ) )
        else { continue };

        let split_at = body.find( |c: char| c.is_ascii_digit() ).unwrap_or( body.len() );
        let ( kind_tag, n ) = body.split_at( split_at );
        if n.is_empty() {
            continue;
        }

        let pattern = fuzzy_key_pattern( kind_tag, n );
        let Ok( re ) = Regex::new( &pattern ) else { continue };
        if re.is_match( &out ) {
            out = re.replace( &out, regex::NoExpand( original ) ).into_owned();
        }
    }

    out
}

fn syntax_polish( s: &str ) -> String {
    static BACKSLASH_GAP: LazyLock<Regex> =
        LazyLock::new( || Regex::new( r"\\\s+([A-Za-z\{\}])" ).unwrap() );
    static TAG_GAP: LazyLock<Regex> =
        LazyLock::new( || Regex::new( r"<\s+([^<>]*?)\s+>" ).unwrap() );
    static HASH_BRACE_GAP: LazyLock<Regex> =
        LazyLock::new( || Regex::new( r"#\s+\{" ).unwrap() );
    static DOLLAR_BRACE_GAP: LazyLock<Regex> =
        LazyLock::new( || Regex::new( r"\$\s+\{" ).unwrap() );

    let s = BACKSLASH_GAP.replace_all( s, r"\$1" );
    let s = TAG_GAP.replace_all( &s, "<$1>" );
    let s = HASH_BRACE_GAP.replace_all( &s, "#{" );
    let s = DOLLAR_BRACE_GAP.replace_all( &s, "${" );
    s.into_owned()
}


/// Returns `(ok, missing)`. A restored text is ok iff every original
/// fragment appears verbatim (whitespace-insensitive), except
/// decorative codes which may be dropped without failure.
#[ tracing::instrument( skip( original, restored, map ) ) ]
pub fn validate_restoration(
    original: &str,
    restored: &str,
    map: &PlaceholderMap,
) -> ( bool, Vec<String> ) {
    let normalized_restored = normalize_whitespace( restored );

    let missing: Vec<String> = map.values()
        .filter( |fragment| {
            let present = normalized_restored.contains( &normalize_whitespace( fragment ) );
            !present && !DECORATIVE_RE.is_match( fragment )
        } )
        .cloned()
        .collect();

    let _ = original;
    ( missing.is_empty(), missing )
}

fn normalize_whitespace( s: &str ) -> String {
    s.split_whitespace().collect::<Vec<_>>().join( " " )
}


/// Last-ditch repair: reinject missing fragments at the start (if they
/// originally sat in the first third of the source) or end (last
/// third, or anywhere in the middle) of the restored text.
#[ tracing::instrument( skip( original, restored, missing ) ) ]
pub fn repair_missing_tokens( original: &str, restored: &str, missing: &[String] ) -> String {
    let len = original.chars().count().max( 1 );
    let mut prefix = Vec::new();
    let mut suffix = Vec::new();

    for fragment in missing {
        let pos = original.find( fragment.as_str() )
            .map( |byte_idx| original[ ..byte_idx ].chars().count() )
            .unwrap_or( len );
        if pos * 3 < len {
            prefix.push( fragment.clone() );
        } else {
            suffix.push( fragment.clone() );
        }
    }

    let mut out = String::new();
    out.push_str( &prefix.join( "" ) );
    out.push_str( restored );
    out.push_str( &suffix.join( "" ) );
    out
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn protect_restore_round_trip() {
        let original = "Hello \\V[1]! <color=red>Warning</color> #{name}";
        let ( protected, map ) = protect( original );
        assert!( !protected.contains( "\\V[1]" ) );
        let restored = restore( &protected, &map );
        assert_eq!( restored, original );
    }

    #[ test ]
    fn protect_never_rekeys_existing_placeholder() {
        let already = format!( "{PLACEHOLDER_OPEN}RLPH_CMD0{PLACEHOLDER_CLOSE}text" );
        let ( protected, map ) = protect( &already );
        assert_eq!( protected, already );
        assert!( map.is_empty() );
    }

    #[ test ]
    fn scenario_s6_protection_under_mt_perturbation() {
        let original = "\\C[2]Attack!";
        let ( protected, map ) = protect( original );
        assert_eq!( protected, format!( "{PLACEHOLDER_OPEN}RLPH_CMD0{PLACEHOLDER_CLOSE}Attack!" ) );

        // MT case-folds and letter-spaces the key, then translates the rest.
        let perturbed = format!(
            "{PLACEHOLDER_OPEN} rlph _ cmd 0 {PLACEHOLDER_CLOSE}\u{00A1}Ataque!"
        );
        let restored = restore( &perturbed, &map );
        assert_eq!( restored, "\\C[2]\u{00A1}Ataque!" );

        let ( ok, _missing ) = validate_restoration( original, &restored, &map );
        assert!( ok );
    }

    #[ test ]
    fn fuzzy_restore_tolerates_transliteration() {
        // Cyrillic lookalikes for C and P in "RLPH_CMD0" -> "С" and wrapped digits.
        let original = "\\C[2]Hi";
        let ( protected, map ) = protect( original );
        assert_eq!( protected, format!( "{PLACEHOLDER_OPEN}RLPH_CMD0{PLACEHOLDER_CLOSE}Hi" ) );

        let translit = protected.replace( 'C', "\u{0421}" ); // RLPH_СMD0
        let restored = restore( &translit, &map );
        assert_eq!( restored, original );
    }

    #[ test ]
    fn validate_tolerates_missing_decorative_code() {
        let original = "\\C[2]Attack!";
        let ( _protected, map ) = protect( original );
        // Simulate a restoration that dropped \C[2] entirely.
        let restored = "Attack!";
        let ( ok, missing ) = validate_restoration( original, restored, &map );
        assert!( ok );
        assert!( missing.is_empty() );
    }

    #[ test ]
    fn validate_fails_on_missing_structural_code() {
        let original = "Hello \\V[1]!";
        let ( _protected, map ) = protect( original );
        let restored = "Hello !";
        let ( ok, missing ) = validate_restoration( original, restored, &map );
        assert!( !ok );
        assert_eq!( missing, vec![ "\\V[1]".to_string() ] );
    }

    #[ test ]
    fn repair_reinjects_prefix_and_suffix_fragments() {
        let original = "\\V[1] walks to the door #{exit}";
        let missing = vec![ "\\V[1]".to_string(), "#{exit}".to_string() ];
        let restored = " walks to the door ";
        let repaired = repair_missing_tokens( original, restored, &missing );
        assert_eq!( repaired, "\\V[1] walks to the door #{exit}" );
    }
}
