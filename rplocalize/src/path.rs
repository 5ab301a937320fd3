//! Reversible path codec.
//!
//! A path names a position inside a nested `serde_json::Value` tree as
//! a `"."`-joined string of segments: integer indices, string keys
//! (with literal dots escaped), and `@`-prefixed markers that hand
//! control to a sub-encoding (`@JSON`, `@JSm`, `@SCRIPTMERGEn`,
//! `@NOTEBLOCK_i`, `@NOTEINLINE_i`). This module only understands the
//! plain index/key part of that grammar; callers in `json_core` and
//! `ruby` split off markers with [`split_at_marker`] and handle the
//! sub-encoding themselves, since what a marker means depends on
//! whether the preceding value was a JSON string, a script body, or a
//! note field.

use serde_json::Value;

use crate::error::PathError;


/// Literal escape token standing in for a `.` inside a key segment.
const DOT_ESCAPE: &str = "__DOT__";

/// Distinguishes a literal occurrence of [`DOT_ESCAPE`] in the original
/// key from one produced by escaping a real dot.
const DOT_ESCAPE_LITERAL_MARKER: &str = "__DOT__ESC__";

/// Sentinel codepoint used only as scratch space during escaping;
/// never appears in the final encoded text.
const SENTINEL: char = '\u{E000}';


/// A single classified path segment.
#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub enum Segment {
    Index( usize ),
    Key( String ),
    Marker( String ),
}

impl Segment {
    fn classify( raw: &str ) -> Self {
        if let Some( rest ) = raw.strip_prefix( '@' ) {
            return Self::Marker( format!( "@{rest}" ) );
        }
        if let Ok( idx ) = raw.parse::<usize>() {
            return Self::Index( idx );
        }
        Self::Key( unescape_key( raw ) )
    }
}


/// Escape a single string segment for inclusion in an encoded path.
#[ tracing::instrument ]
pub fn encode_segment( s: &str ) -> String {
    let protected = s.replace( DOT_ESCAPE, &SENTINEL.to_string() );
    let dots_escaped = protected.replace( '.', DOT_ESCAPE );
    dots_escaped.replace( SENTINEL, DOT_ESCAPE_LITERAL_MARKER )
}

fn unescape_key( raw: &str ) -> String {
    raw
        .replace( DOT_ESCAPE_LITERAL_MARKER, &SENTINEL.to_string() )
        .replace( DOT_ESCAPE, "." )
        .replace( SENTINEL, DOT_ESCAPE )
}


/// Split an encoded path into its raw text segments (dots un-escaped,
/// empties dropped), without yet classifying them.
#[ tracing::instrument ]
pub fn decode_path( p: &str ) -> Vec<Segment> {
    p.split( '.' )
        .filter( |s| !s.is_empty() )
        .map( Segment::classify )
        .collect()
}


/// Join already-classified segments back into an encoded path string.
pub fn encode_path( segments: &[Segment] ) -> String {
    segments.iter()
        .map( |seg| match seg {
            Segment::Index( i ) => i.to_string(),
            Segment::Key( k ) => encode_segment( k ),
            Segment::Marker( m ) => m.clone(),
        } )
        .collect::<Vec<_>>()
        .join( "." )
}


/// Split an encoded path at its first marker segment, if any.
///
/// Returns `(plain_prefix, Some((marker, remaining_path)))` when a
/// marker is present, `(whole_path, None)` otherwise.
pub fn split_at_marker( p: &str ) -> ( Vec<Segment>, Option<( String, Vec<Segment> )> ) {
    let segments = decode_path( p );
    match segments.iter().position( |s| matches!( s, Segment::Marker(_) ) ) {
        Some( idx ) => {
            let prefix = segments[ ..idx ].to_vec();
            let Segment::Marker( marker ) = segments[ idx ].clone() else { unreachable!() };
            let rest = segments[ idx + 1.. ].to_vec();
            ( prefix, Some( ( marker, rest ) ) )
        }
        None => ( segments, None ),
    }
}


/// Traverse `root` by plain index/key segments, never crossing a
/// marker. Returns `None` on an out-of-range index or unknown key
/// rather than an error, per §4.1 ("out-of-range index or unknown key
/// is logged and causes a skip").
#[ tracing::instrument( skip( root ) ) ]
pub fn get<'v>( root: &'v Value, segments: &[Segment] ) -> Option<&'v Value> {
    let mut cur = root;
    let mut rest = segments;

    while !rest.is_empty() {
        let ( next, consumed ) = step( cur, rest )?;
        cur = next;
        rest = &rest[ consumed.. ];
    }

    Some( cur )
}


/// Mutable counterpart of [`get`], for callers that need to keep
/// traversing (e.g. to mutate an array element in place) rather than
/// overwrite a single leaf with [`set`].
#[ tracing::instrument( skip( root ) ) ]
pub fn get_mut<'v>( root: &'v mut Value, segments: &[Segment] ) -> Option<&'v mut Value> {
    let mut cur = root;
    let mut rest = segments;

    while !rest.is_empty() {
        let ( next, consumed ) = step_mut( cur, rest )?;
        cur = next;
        rest = &rest[ consumed.. ];
    }

    Some( cur )
}


/// Mutating counterpart of [`get`]. The traversal is total: on a
/// failed lookup nothing is mutated and `None` is returned.
#[ tracing::instrument( skip( root, value ) ) ]
pub fn set( root: &mut Value, segments: &[Segment], value: Value ) -> Option<()> {
    if segments.is_empty() {
        *root = value;
        return Some(());
    }

    let ( last, parents ) = segments.split_last()?;

    let mut cur = root;
    let mut rest = parents;
    while !rest.is_empty() {
        let ( next, consumed ) = step_mut( cur, rest )?;
        cur = next;
        rest = &rest[ consumed.. ];
    }

    set_one( cur, last, value )
}


/// Descend one logical level, possibly consuming more than one segment
/// when the legacy dotted-key fallback kicks in (a key containing a
/// literal, unescaped `.` written by an earlier version).
fn step<'v>( cur: &'v Value, segments: &[Segment] ) -> Option<( &'v Value, usize )> {
    match ( cur, &segments[0] ) {
        ( Value::Array( arr ), Segment::Index( i ) ) =>
            arr.get( *i ).map( |v| ( v, 1 ) ),

        ( Value::Object( map ), Segment::Key( k ) ) => {
            if let Some( v ) = map.get( k ) {
                return Some( ( v, 1 ) );
            }
            legacy_dotted_lookup( map, segments )
                .map( |( v, n )| ( v, n ) )
        }

        _ => None,
    }
}

fn step_mut<'v>( cur: &'v mut Value, segments: &[Segment] ) -> Option<( &'v mut Value, usize )> {
    match ( cur, &segments[0] ) {
        ( Value::Array( arr ), Segment::Index( i ) ) =>
            arr.get_mut( *i ).map( |v| ( v, 1 ) ),

        ( Value::Object( map ), Segment::Key( k ) ) => {
            if map.contains_key( k ) {
                return map.get_mut( k ).map( |v| ( v, 1 ) );
            }
            let consumed = legacy_dotted_lookup( map, segments ).map( |( _, n )| n )?;
            let joined = join_legacy_key( segments, consumed );
            map.get_mut( &joined ).map( |v| ( v, consumed ) )
        }

        _ => None,
    }
}

fn set_one( cur: &mut Value, last: &Segment, value: Value ) -> Option<()> {
    match ( cur, last ) {
        ( Value::Array( arr ), Segment::Index( i ) ) => {
            let slot = arr.get_mut( *i )?;
            *slot = value;
            Some(())
        }
        ( Value::Object( map ), Segment::Key( k ) ) => {
            if let Some( slot ) = map.get_mut( k ) {
                *slot = value;
                return Some(());
            }
            // legacy fallback: try to find an existing key equal to
            // `k` joined with however many of the (nonexistent) further
            // segments would reconstruct a historical dotted key. With
            // no further segments available at the leaf there is
            // nothing to greedily merge, so this is a genuine miss.
            None
        }
        _ => None,
    }
}

/// Greedily join consecutive `Key` segments (re-inserting literal dots
/// between them) looking for a key that was written, by an earlier
/// version of this tool, before dot-escaping existed.
fn legacy_dotted_lookup<'v>(
    map: &'v serde_json::Map<String, Value>,
    segments: &[Segment],
) -> Option<( &'v Value, usize )> {
    let mut joined = match &segments[0] {
        Segment::Key( k ) => k.clone(),
        _ => return None,
    };

    for take in 2..=segments.len() {
        match &segments[ take - 1 ] {
            Segment::Key( k ) => joined.push_str( &format!( ".{k}" ) ),
            _ => break,
        }
        if let Some( v ) = map.get( &joined ) {
            return Some( ( v, take ) );
        }
    }

    None
}

fn join_legacy_key( segments: &[Segment], take: usize ) -> String {
    segments[ ..take ].iter()
        .filter_map( |s| match s {
            Segment::Key( k ) => Some( k.clone() ),
            _ => None,
        } )
        .collect::<Vec<_>>()
        .join( "." )
}


#[ cfg( test ) ]
mod tests {
    use super::*;
    use serde_json::json;

    #[ test ]
    fn encode_decode_round_trip_plain_key() {
        let encoded = encode_segment( "profile" );
        assert_eq!( encoded, "profile" );
    }

    #[ test ]
    fn encode_decode_round_trip_dotted_key() {
        let encoded = encode_segment( "a.b.c" );
        assert_eq!( encoded, "a__DOT__b__DOT__c" );
        let segments = decode_path( &encoded );
        assert_eq!( segments, vec![ Segment::Key( "a.b.c".into() ) ] );
    }

    #[ test ]
    fn encode_decode_round_trip_literal_escape_token() {
        let encoded = encode_segment( "weird__DOT__key" );
        let segments = decode_path( &encoded );
        assert_eq!( segments, vec![ Segment::Key( "weird__DOT__key".into() ) ] );
    }

    #[ test ]
    fn classify_index_key_marker() {
        let segments = decode_path( "0.parameters.4.@JSON.title" );
        assert_eq!( segments, vec![
            Segment::Index( 0 ),
            Segment::Key( "parameters".into() ),
            Segment::Index( 4 ),
            Segment::Marker( "@JSON".into() ),
            Segment::Key( "title".into() ),
        ] );
    }

    #[ test ]
    fn split_at_marker_splits_correctly() {
        let ( prefix, rest ) = split_at_marker( "parameters.title.@JSON.title" );
        assert_eq!( prefix, vec![
            Segment::Key( "parameters".into() ),
            Segment::Key( "title".into() ),
        ] );
        let ( marker, tail ) = rest.unwrap();
        assert_eq!( marker, "@JSON" );
        assert_eq!( tail, vec![ Segment::Key( "title".into() ) ] );
    }

    #[ test ]
    fn get_traverses_array_and_object() {
        let tree = json!( { "events": [ { "code": 401, "parameters": [ "hi" ] } ] } );
        let segments = decode_path( "events.0.parameters.0" );
        let value = get( &tree, &segments ).unwrap();
        assert_eq!( value, "hi" );
    }

    #[ test ]
    fn get_missing_path_returns_none_not_error() {
        let tree = json!( { "events": [] } );
        let segments = decode_path( "events.5.parameters.0" );
        assert!( get( &tree, &segments ).is_none() );
    }

    #[ test ]
    fn set_mutates_exactly_one_value() {
        let mut tree = json!( { "a": [ "x", "y" ], "b": "z" } );
        let segments = decode_path( "a.1" );
        set( &mut tree, &segments, json!( "Y" ) ).unwrap();
        assert_eq!( tree, json!( { "a": [ "x", "Y" ], "b": "z" } ) );
    }

    #[ test ]
    fn set_on_unknown_path_is_noop() {
        let mut tree = json!( { "a": "x" } );
        let before = tree.clone();
        let segments = decode_path( "missing.path" );
        assert!( set( &mut tree, &segments, json!( "y" ) ).is_none() );
        assert_eq!( tree, before );
    }

    #[ test ]
    fn legacy_dotted_key_fallback() {
        let mut map = serde_json::Map::new();
        map.insert( "a.b".to_string(), json!( "legacy" ) );
        let tree = Value::Object( map );
        let segments = vec![ Segment::Key( "a".into() ), Segment::Key( "b".into() ) ];
        let value = get( &tree, &segments ).unwrap();
        assert_eq!( value, "legacy" );
    }
}
