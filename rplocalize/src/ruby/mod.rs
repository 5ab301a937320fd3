//! Ruby Marshal extractor/injector for RPG Maker XP/VX/VX Ace projects
//!. Mirrors [`crate::json_core`]'s walk/dispatch shape for
//! a Marshal-serialized object tree instead of a `serde_json::Value`
//! tree, grounded on `original_source/src/core/parsers/ruby_parser.py`
//! (`RubyParser._walk`/`_check_and_walk`/`_extract_event_command`/
//! `_process_scripts_array`).
//!
//! The Marshal codec itself lives in [`marshal`]: a tree shaped very
//! close to the Python `rubymarshal` library this was ported from —
//! arrays, hashes, bare Ruby strings as raw bytes (since XP/VX/Ace
//! games are routinely Shift-JIS, not UTF-8), symbols, and "objects"
//! as a class name plus an ordered list of `@ivar -> value` pairs.
//! [`RValue`] is a crate-local alias of that shape so the rest of
//! this module reads like `json_core`'s walk over `serde_json::Value`.

use std::collections::HashMap;

pub mod marshal;
use marshal::Value as RValue;

use crate::error::MarshalError;
use crate::json_core::{ ExtractConfig, ExtractedText, TextContext };
use crate::lore::{
    event_code, MARSHAL_FIELD_WHITELIST, MARSHAL_MAX_DEPTH, RUBY_ENCODING_FALLBACK,
    SOUND_OBJECT_KEYS,
};
use crate::note_tag;
use crate::ruby_tokenizer;
use crate::safety::is_safe_to_translate_ctx;

use encoding_rs::Encoding;
use std::io::{ Read, Write };


/// Parse a `.rvdata2`/`.rxdata`/`.rvdata` buffer into its Marshal tree.
#[ tracing::instrument( skip( bytes ) ) ]
pub fn load( bytes: &[ u8 ] ) -> Result<RValue, MarshalError> {
    marshal::load( bytes )
}

/// Re-serialize a Marshal tree back into bytes.
#[ tracing::instrument( skip( value ) ) ]
pub fn dump( value: &RValue ) -> Result<Vec<u8>, MarshalError> {
    marshal::dump( value )
}


/// Decode a raw Ruby string under the fallback chain
/// (`utf-8, shift_jis, cp1252, iso-8859-1`), returning the first
/// encoding that decodes cleanly (never lossy unless all four fail,
/// in which case UTF-8 lossy decoding is the last resort).
#[ tracing::instrument( skip( bytes ) ) ]
pub fn decode_ruby_bytes( bytes: &[ u8 ] ) -> String {
    for name in RUBY_ENCODING_FALLBACK {
        if *name == "utf-8" {
            if let Ok( s ) = std::str::from_utf8( bytes ) {
                return s.to_string();
            }
            continue;
        }
        // `encoding_rs` maps the WHATWG labels "latin1"/"iso-8859-1" to
        // windows-1252 (same as the `cp1252` step above, five bytes
        // short of a full byte->codepoint mapping), so the true
        // single-byte Latin-1 decode is done by hand here: every byte
        // 0x00-0xFF is its own Unicode code point, so this step never
        // fails and is the actual last resort before lossy UTF-8.
        if *name == "iso-8859-1" {
            return bytes.iter().map( |&b| b as char ).collect();
        }
        let Some( encoding ) = Encoding::for_label( name.as_bytes() ) else { continue };
        let ( decoded, _, had_errors ) = encoding.decode( bytes );
        if !had_errors {
            return decoded.into_owned();
        }
    }
    String::from_utf8_lossy( bytes ).into_owned()
}


fn attr<'v>( attrs: &'v [ ( String, RValue ) ], name: &str ) -> Option<&'v RValue> {
    attrs.iter().find( |( k, _ )| k.trim_start_matches( '@' ) == name ).map( |( _, v )| v )
}

fn as_object( value: &RValue ) -> Option<&[ ( String, RValue ) ]> {
    match value {
        RValue::Object { variables, .. } => Some( variables ),
        _ => None,
    }
}

fn as_object_mut( value: &mut RValue ) -> Option<&mut Vec<( String, RValue )>> {
    match value {
        RValue::Object { variables, .. } => Some( variables ),
        _ => None,
    }
}

fn bytes_text( value: &RValue ) -> Option<String> {
    match value {
        RValue::String( bytes ) => Some( decode_ruby_bytes( bytes ) ),
        RValue::Symbol( s ) => Some( s.clone() ),
        _ => None,
    }
}


/// Extract every translatable string from a parsed Marshal tree.
#[ tracing::instrument( skip( root ) ) ]
pub fn extract( root: &RValue, cfg: &ExtractConfig ) -> Vec<ExtractedText> {
    let mut out = Vec::new();

    if let Some( scripts ) = as_scripts_array( root ) {
        extract_scripts( scripts, &mut out );
        return out;
    }

    let mut visited = std::collections::HashSet::new();
    walk( root, "", 0, &mut visited, cfg, &mut out );
    out
}

/// Recognizes the `Scripts.rvdata2` shape: a top-level array of
/// `[id, name, compressed_code]` triples whose third element is a raw
/// byte string.
fn as_scripts_array( root: &RValue ) -> Option<&[ RValue ]> {
    let RValue::Array( entries ) = root else { return None };
    let first = entries.first()?;
    let RValue::Array( triple ) = first else { return None };
    if triple.len() != 3 {
        return None;
    }
    matches!( triple[ 2 ], RValue::String( _ ) ).then_some( entries.as_slice() )
}

fn extract_scripts( entries: &[ RValue ], out: &mut Vec<ExtractedText> ) {
    for ( i, entry ) in entries.iter().enumerate() {
        let RValue::Array( triple ) = entry else { continue };
        let Some( RValue::String( compressed ) ) = triple.get( 2 ) else { continue };

        let Ok( code_bytes ) = inflate( compressed ) else { continue };
        let code_text = decode_ruby_bytes( &code_bytes );

        let mut seen = std::collections::HashSet::new();
        for ( j, tok ) in ruby_tokenizer::extract_translatable_strings( &code_text ).into_iter().enumerate() {
            if !seen.insert( tok.value.clone() ) {
                continue;
            }
            if !is_safe_to_translate_ctx( &tok.value, true ) {
                continue;
            }
            out.push( ExtractedText {
                path: format!( "{i}.code.string_{j}" ),
                text: tok.value,
                context: TextContext::Dialogue,
            } );
        }
    }
}

fn inflate( compressed: &[ u8 ] ) -> std::io::Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new( compressed );
    let mut out = Vec::new();
    decoder.read_to_end( &mut out )?;
    Ok( out )
}

fn deflate( raw: &[ u8 ] ) -> std::io::Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new( Vec::new(), flate2::Compression::default() );
    encoder.write_all( raw )?;
    encoder.finish()
}


fn walk(
    value: &RValue,
    path: &str,
    depth: usize,
    visited: &mut std::collections::HashSet<usize>,
    cfg: &ExtractConfig,
    out: &mut Vec<ExtractedText>,
) {
    if depth > MARSHAL_MAX_DEPTH {
        return;
    }

    match value {
        RValue::Array( items ) => {
            let id = items.as_ptr() as usize;
            if !visited.insert( id ) {
                return;
            }
            walk_array( items, path, depth, visited, cfg, out );
        }
        RValue::Hash( pairs ) => {
            let id = pairs.as_ptr() as usize;
            if !visited.insert( id ) {
                return;
            }
            for ( k, v ) in pairs {
                let Some( key ) = bytes_text( k ) else { continue };
                let new_path = join_path( path, &key );
                walk( v, &new_path, depth + 1, visited, cfg, out );
            }
        }
        RValue::Object { variables, .. } => {
            let id = variables.as_ptr() as usize;
            if !visited.insert( id ) {
                return;
            }
            walk_object( variables, path, depth, visited, cfg, out );
        }
        _ => {}
    }
}

fn walk_array(
    items: &[ RValue ],
    path: &str,
    depth: usize,
    visited: &mut std::collections::HashSet<usize>,
    cfg: &ExtractConfig,
    out: &mut Vec<ExtractedText>,
) {
    let mut i = 0;
    while i < items.len() {
        let new_path = join_path( path, &i.to_string() );

        if let Some( attrs ) = as_object( &items[ i ] ) {
            if let ( Some( code ), Some( params ) ) = ( attr( attrs, "code" ), attr( attrs, "parameters" ) ) {
                process_event_command( code, params, &new_path, cfg, out );
                i += 1;
                continue;
            }
        }

        walk( &items[ i ], &new_path, depth + 1, visited, cfg, out );
        i += 1;
    }
}

fn walk_object(
    attrs: &[ ( String, RValue ) ],
    path: &str,
    depth: usize,
    visited: &mut std::collections::HashSet<usize>,
    cfg: &ExtractConfig,
    out: &mut Vec<ExtractedText>,
) {
    let is_sound_obj = SOUND_OBJECT_KEYS.iter().all( |k| attr( attrs, k ).is_some() );

    for ( raw_key, value ) in attrs {
        let key = raw_key.trim_start_matches( '@' );

        if is_sound_obj && key == "name" {
            continue;
        }
        if key == "note" && !cfg.translate_notes {
            continue;
        }

        let new_path = join_path( path, &format!( "@{key}" ) );

        if key == "note" {
            if let Some( text ) = bytes_text( value ) {
                extract_note_field( &text, &new_path, out );
                continue;
            }
        }

        if MARSHAL_FIELD_WHITELIST.contains( &key ) {
            if let Some( text ) = bytes_text( value ) {
                if is_safe_to_translate_ctx( &text, key != "note" ) {
                    let context = if matches!( key, "name" | "nickname" | "title" | "game_title" | "currency_unit" | "display_name" ) {
                        TextContext::Name
                    } else {
                        TextContext::Dialogue
                    };
                    out.push( ExtractedText { path: new_path, text, context } );
                    continue;
                }
            }
        }

        if matches!( key, "words" | "terms" ) {
            extract_system_container( value, &new_path, out );
            continue;
        }

        walk( value, &new_path, depth + 1, visited, cfg, out );
    }
}

fn extract_system_container( value: &RValue, path: &str, out: &mut Vec<ExtractedText> ) {
    match value {
        RValue::Object { variables, .. } => {
            for ( k, v ) in variables {
                let key = k.trim_start_matches( '@' );
                let new_path = join_path( path, &format!( "@{key}" ) );
                extract_system_container( v, &new_path, out );
            }
        }
        RValue::Array( items ) => {
            for ( i, item ) in items.iter().enumerate() {
                if let Some( text ) = bytes_text( item ) {
                    if is_safe_to_translate_ctx( &text, true ) {
                        out.push( ExtractedText {
                            path: join_path( path, &i.to_string() ), text, context: TextContext::System,
                        } );
                    }
                }
            }
        }
        other => {
            if let Some( text ) = bytes_text( other ) {
                if is_safe_to_translate_ctx( &text, true ) {
                    out.push( ExtractedText { path: path.to_string(), text, context: TextContext::System } );
                }
            }
        }
    }
}

fn extract_note_field( note_text: &str, path: &str, out: &mut Vec<ExtractedText> ) {
    for ( i, segment ) in note_tag::parse_note( note_text ).into_iter()
        .filter( |s| s.translatable && !s.text.is_empty() )
        .enumerate()
    {
        let marker = match segment.kind {
            note_tag::SegmentKind::BlockTag => format!( "@NOTEBLOCK_{i}" ),
            _ => format!( "@NOTEINLINE_{i}" ),
        };
        out.push( ExtractedText { path: format!( "{path}.{marker}" ), text: segment.text, context: TextContext::System } );
    }
}

fn process_event_command(
    code: &RValue,
    params: &RValue,
    path: &str,
    cfg: &ExtractConfig,
    out: &mut Vec<ExtractedText>,
) {
    let RValue::Integer( code ) = code else { return };
    let code = *code;
    let RValue::Array( params ) = params else { return };

    let push = |out: &mut Vec<ExtractedText>, idx: usize, text: String, context: TextContext| {
        out.push( ExtractedText { path: format!( "{path}.@parameters.{idx}" ), text, context } );
    };

    match code {
        c if c == event_code::SHOW_TEXT_LINE || c == event_code::SCROLL_TEXT_LINE => {
            if let Some( text ) = params.first().and_then( bytes_text ) {
                if is_safe_to_translate_ctx( &text, true ) {
                    push( out, 0, text, TextContext::Dialogue );
                }
            }
        }
        c if c == event_code::SHOW_TEXT_HEADER => {
            if let Some( text ) = params.get( 4 ).and_then( bytes_text ) {
                if is_safe_to_translate_ctx( &text, true ) {
                    push( out, 4, text, TextContext::Name );
                }
            }
        }
        c if c == event_code::SCROLL_TEXT_HEADER => {
            if let Some( text ) = params.get( 2 ).and_then( bytes_text ) {
                if is_safe_to_translate_ctx( &text, true ) {
                    push( out, 2, text, TextContext::System );
                }
            }
        }
        c if c == event_code::SHOW_CHOICES => {
            if let Some( RValue::Array( choices ) ) = params.first() {
                for ( ci, choice ) in choices.iter().enumerate() {
                    if let Some( text ) = bytes_text( choice ) {
                        if is_safe_to_translate_ctx( &text, true ) {
                            out.push( ExtractedText {
                                path: format!( "{path}.@parameters.0.{ci}" ), text, context: TextContext::Choice,
                            } );
                        }
                    }
                }
            }
        }
        c if c == event_code::WHEN_CHOICE_LABEL => {
            if let Some( text ) = params.get( 1 ).and_then( bytes_text ) {
                if is_safe_to_translate_ctx( &text, true ) {
                    push( out, 1, text, TextContext::Choice );
                }
            }
        }
        c if ( c == event_code::COMMENT || c == event_code::COMMENT_CONT ) && cfg.translate_comments => {
            if let Some( text ) = params.first().and_then( bytes_text ) {
                let trimmed = text.trim();
                if is_safe_to_translate_ctx( trimmed, false )
                    && ( trimmed.contains( ' ' ) || trimmed.chars().count() > 20 )
                {
                    push( out, 0, text, TextContext::Comment );
                }
            }
        }
        c if matches!( c, event_code::CHANGE_NAME | event_code::CHANGE_NICKNAME | event_code::CHANGE_PROFILE ) => {
            if let Some( text ) = params.get( 1 ).and_then( bytes_text ) {
                if is_safe_to_translate_ctx( &text, false ) {
                    push( out, 1, text, TextContext::Name );
                }
            }
        }
        _ => {}
    }
}

fn join_path( base: &str, segment: &str ) -> String {
    if base.is_empty() { segment.to_string() } else { format!( "{base}.{segment}" ) }
}


/// Apply a path -> translated text map onto a parsed Marshal tree,
/// in place.
#[ tracing::instrument( skip( root, translations ) ) ]
pub fn inject( root: &mut RValue, translations: &HashMap<String, String> ) {
    if let Some( entries ) = as_scripts_array_mut( root ) {
        apply_script_translations( entries, translations );
        return;
    }

    let mut note_updates: HashMap<String, Vec<( usize, String )>> = HashMap::new();
    let mut direct_updates: Vec<( String, String )> = Vec::new();

    for ( path, text ) in translations {
        if let Some( ( root_path, marker ) ) = find_note_marker( path ) {
            note_updates.entry( root_path ).or_default().push( marker );
            let _ = text;
        } else {
            direct_updates.push( ( path.clone(), text.clone() ) );
        }
    }

    for ( path, text ) in &direct_updates {
        if text.is_empty() {
            continue;
        }
        apply_direct( root, path, text );
    }

    for ( root_path, updates ) in note_updates {
        apply_note_translation( root, &root_path, &updates, translations );
    }
}

fn as_scripts_array_mut( root: &mut RValue ) -> Option<&mut Vec<RValue>> {
    let is_scripts = as_scripts_array( root ).is_some();
    if !is_scripts {
        return None;
    }
    match root {
        RValue::Array( entries ) => Some( entries ),
        _ => None,
    }
}

fn find_note_marker( path: &str ) -> Option<( String, ( usize, String ) )> {
    for marker in [ ".@NOTEBLOCK_", ".@NOTEINLINE_" ] {
        if let Some( idx ) = path.find( marker ) {
            let root = path[ ..idx ].to_string();
            let index_str = &path[ idx + marker.len().. ];
            if let Ok( seg_index ) = index_str.parse::<usize>() {
                return Some( ( root, ( seg_index, path.to_string() ) ) );
            }
        }
    }
    None
}

fn apply_note_translation(
    root: &mut RValue,
    root_path: &str,
    updates: &[ ( usize, String ) ],
    translations: &HashMap<String, String>,
) {
    let Some( slot ) = rv_get_mut( root, root_path ) else { return };
    let Some( note_text ) = bytes_text( slot ) else { return };

    let originals: Vec<String> = note_tag::parse_note( &note_text ).into_iter()
        .filter( |s| s.translatable && !s.text.is_empty() )
        .map( |s| s.text )
        .collect();

    let mut swap = HashMap::new();
    for ( idx, full_path ) in updates {
        let Some( translated ) = translations.get( full_path ) else { continue };
        if translated.is_empty() {
            continue;
        }
        if let Some( original ) = originals.get( *idx ) {
            swap.insert( original.clone(), translated.clone() );
        }
    }
    if swap.is_empty() {
        return;
    }

    let rebuilt = note_tag::rebuild_note( &note_text, &swap );
    *slot = RValue::String( rebuilt.into_bytes() );
}

fn apply_direct( root: &mut RValue, path: &str, text: &str ) {
    if let Some( slot ) = rv_get_mut( root, path ) {
        *slot = RValue::String( text.as_bytes().to_vec() );
    }
}

/// Resolve a dotted path (array index / `@ivar` attribute / hash key)
/// against a Marshal tree, mutably.
fn rv_get_mut<'v>( root: &'v mut RValue, path: &str ) -> Option<&'v mut RValue> {
    let mut cur = root;
    for segment in path.split( '.' ).filter( |s| !s.is_empty() ) {
        cur = step_mut( cur, segment )?;
    }
    Some( cur )
}

fn step_mut<'v>( value: &'v mut RValue, segment: &str ) -> Option<&'v mut RValue> {
    if let Some( attr_name ) = segment.strip_prefix( '@' ) {
        let variables = as_object_mut( value )?;
        return variables.iter_mut()
            .find( |( k, _ )| k.trim_start_matches( '@' ) == attr_name )
            .map( |( _, v )| v );
    }
    if let Ok( idx ) = segment.parse::<usize>() {
        if let RValue::Array( items ) = value {
            return items.get_mut( idx );
        }
        return None;
    }
    if let RValue::Hash( pairs ) = value {
        return pairs.iter_mut()
            .find( |( k, _ )| bytes_text( k ).as_deref() == Some( segment ) )
            .map( |( _, v )| v );
    }
    None
}

fn apply_script_translations( entries: &mut [ RValue ], translations: &HashMap<String, String> ) {
    let mut by_script: HashMap<usize, Vec<( usize, String )>> = HashMap::new();

    for ( path, text ) in translations {
        let mut parts = path.splitn( 3, '.' );
        let ( Some( i_str ), Some( "code" ), Some( rest ) ) = ( parts.next(), parts.next(), parts.next() )
        else { continue };
        let Ok( i ) = i_str.parse::<usize>() else { continue };
        let Some( j_str ) = rest.strip_prefix( "string_" ) else { continue };
        let Ok( j ) = j_str.parse::<usize>() else { continue };
        if text.is_empty() {
            continue;
        }
        by_script.entry( i ).or_default().push( ( j, text.clone() ) );
    }

    for ( i, updates ) in by_script {
        let Some( RValue::Array( triple ) ) = entries.get_mut( i ) else { continue };
        let Some( RValue::String( compressed ) ) = triple.get( 2 ) else { continue };
        let Ok( code_bytes ) = inflate( compressed ) else { continue };
        let mut code_text = decode_ruby_bytes( &code_bytes );

        let strings = ruby_tokenizer::extract_translatable_strings( &code_text );
        let mut sorted = updates;
        sorted.sort_by( |a, b| b.0.cmp( &a.0 ) );

        for ( j, text ) in sorted {
            let Some( tok ) = strings.get( j ) else { continue };
            code_text = ruby_tokenizer::replace_string_at( &code_text, tok, &text );
        }

        let Ok( recompressed ) = deflate( code_text.as_bytes() ) else { continue };
        if let Some( RValue::String( slot ) ) = triple.get_mut( 2 ) {
            *slot = recompressed;
        }
    }
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    fn obj( class: &str, attrs: Vec<( &str, RValue )> ) -> RValue {
        RValue::Object {
            class_name: class.to_string(),
            variables: attrs.into_iter().map( |( k, v )| ( k.to_string(), v ) ).collect(),
        }
    }

    fn rstr( s: &str ) -> RValue { RValue::String( s.as_bytes().to_vec() ) }

    #[ test ]
    fn extracts_actor_name_attribute() {
        let tree = RValue::Array( vec![
            RValue::Nil,
            obj( "RPG::Actor", vec![ ( "@name", rstr( "Hero" ) ), ( "@id", RValue::Integer( 1 ) ) ] ),
        ] );
        let out = extract( &tree, &ExtractConfig::default() );
        assert!( out.iter().any( |e| e.text == "Hero" && e.path == "1.@name" ) );
    }

    #[ test ]
    fn skips_sound_object_name_attribute() {
        let sound = obj( "RPG::AudioFile", vec![
            ( "@name", rstr( "Battle1" ) ),
            ( "@volume", RValue::Integer( 90 ) ),
            ( "@pitch", RValue::Integer( 100 ) ),
            ( "@pan", RValue::Integer( 0 ) ),
        ] );
        let tree = obj( "RPG::System", vec![ ( "@title_bgm", sound ) ] );
        let out = extract( &tree, &ExtractConfig::default() );
        assert!( !out.iter().any( |e| e.text == "Battle1" ) );
    }

    #[ test ]
    fn extracts_show_text_event_command() {
        let cmd = obj( "RPG::EventCommand", vec![
            ( "@code", RValue::Integer( 401 ) ),
            ( "@parameters", RValue::Array( vec![ rstr( "Hello there, friend!" ) ] ) ),
        ] );
        let tree = RValue::Array( vec![ cmd ] );
        let out = extract( &tree, &ExtractConfig::default() );
        assert_eq!( out.len(), 1 );
        assert_eq!( out[ 0 ].path, "0.@parameters.0" );
    }

    #[ test ]
    fn direct_injection_round_trip() {
        let mut tree = RValue::Array( vec![
            RValue::Nil,
            obj( "RPG::Actor", vec![ ( "@name", rstr( "Hero" ) ) ] ),
        ] );
        let mut translations = HashMap::new();
        translations.insert( "1.@name".to_string(), "Heros".to_string() );
        inject( &mut tree, &translations );

        let RValue::Array( items ) = &tree else { unreachable!() };
        let RValue::Object { variables, .. } = &items[ 1 ] else { unreachable!() };
        assert_eq!( bytes_text( &variables[ 0 ].1 ).unwrap(), "Heros" );
    }

    #[ test ]
    fn note_field_extraction_and_injection_round_trip() {
        let note = "<Custom Death Message>\nHero falls!\n</Custom Death Message>\n<MHP: 100>";
        let mut tree = RValue::Array( vec![ obj( "RPG::Actor", vec![ ( "@note", rstr( note ) ) ] ) ] );

        let cfg = ExtractConfig { translate_notes: true, translate_comments: true };
        let out = extract( &tree, &cfg );
        assert!( out.iter().any( |e| e.text == "Hero falls!" ) );

        let mut translations = HashMap::new();
        translations.insert( out[ 0 ].path.clone(), "Kahraman düştü!".to_string() );
        inject( &mut tree, &translations );

        let RValue::Array( items ) = &tree else { unreachable!() };
        let RValue::Object { variables, .. } = &items[ 0 ] else { unreachable!() };
        let new_note = bytes_text( &variables[ 0 ].1 ).unwrap();
        assert!( new_note.contains( "Kahraman düştü!" ) );
        assert!( new_note.contains( "<MHP: 100>" ) );
    }

    #[ test ]
    fn scripts_array_extraction_and_injection_round_trip() {
        let code = r#"$game_message.add("Fire!")"#;
        let compressed = deflate( code.as_bytes() ).unwrap();
        let mut tree = RValue::Array( vec![
            RValue::Array( vec![ RValue::Integer( 1 ), rstr( "Script1" ), RValue::String( compressed ) ] ),
        ] );

        let out = extract( &tree, &ExtractConfig::default() );
        assert!( out.iter().any( |e| e.text == "Fire!" && e.path == "0.code.string_0" ) );

        let mut translations = HashMap::new();
        translations.insert( "0.code.string_0".to_string(), "Feuer!".to_string() );
        inject( &mut tree, &translations );

        let RValue::Array( entries ) = &tree else { unreachable!() };
        let RValue::Array( triple ) = &entries[ 0 ] else { unreachable!() };
        let RValue::String( recompressed ) = &triple[ 2 ] else { unreachable!() };
        let decompressed = inflate( recompressed ).unwrap();
        assert!( String::from_utf8( decompressed ).unwrap().contains( "Feuer!" ) );
    }

    #[ test ]
    fn encoding_fallback_decodes_shift_jis() {
        let ( bytes, _, _ ) = encoding_rs::SHIFT_JIS.encode( "勇者" );
        let decoded = decode_ruby_bytes( &bytes );
        assert_eq!( decoded, "勇者" );
    }
}
