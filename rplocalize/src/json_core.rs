//! JSON extractor/injector for RPG Maker MV/MZ projects.
//!
//! Grounded on `original_source/src/core/parsers/json_parser.py`
//! (`JsonParser`) for the recursive-walk/dispatch shape — locale files,
//! `plugins.js`, generic database JSON, event-command tables, nested
//! `@JSON` strings, merged script/plugin-command blocks — and on
//! `KATBlackCoder-Translate-AI/src-tauri/src/core/rpgmv/common.rs`
//! (`extract_translatable_strings_from_event_command_list`,
//! `reconstruct_event_command_list`) for the idiomatic Rust shape of
//! walking a command list and reconstructing it from a translation map.
//!
//! `specialized_plugins.py`'s per-plugin extractors are not ported: the
//! retrieval pack carries no sample of that module's actual plugin
//! table, so every plugin parameter block falls through to the generic
//! walk here instead of a plugin-specific one.

use std::collections::HashMap;

use serde_json::{ Map, Value };

use crate::error::JsonCoreError;
use crate::lore::{
    event_code, ASSET_KEY_HINTS, CODE_KEY_SUFFIXES, DATABASE_FIELD_WHITELIST,
    SKIP_FIELDS, SOUND_OBJECT_KEYS, SYSTEM_TERM_KEYS, TEXT_KEY_INDICATORS, TEXT_KEY_SUFFIXES,
};
use crate::note_tag;
use crate::path;
use crate::safety::{ is_safe_to_translate_ctx, is_technical_string, looks_like_asset_name };
use crate::js_tokenizer;


#[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
pub enum TextContext {
    Dialogue,
    Name,
    System,
    Comment,
    Choice,
}

#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub struct ExtractedText {
    pub path: String,
    pub text: String,
    pub context: TextContext,
}

#[ derive( Debug, Clone, Copy ) ]
pub struct ExtractConfig {
    pub translate_notes: bool,
    pub translate_comments: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { translate_notes: false, translate_comments: true }
    }
}


/// Extract translatable text from one file's contents. Dispatches on
/// `file_path` between locale files, `plugins.js`, and generic
/// database/map JSON.
#[ tracing::instrument( skip( content ) ) ]
pub fn extract_text(
    file_path: &str,
    content: &str,
    cfg: &ExtractConfig,
) -> Result<Vec<ExtractedText>, JsonCoreError> {
    let content = content.trim();
    if content.is_empty() {
        return Ok( Vec::new() );
    }

    let mut out = Vec::new();

    if file_path.to_lowercase().ends_with( ".js" ) {
        let ( _, json_str, _ ) = extract_js_json( content )?;
        let data: Value = serde_json::from_str( &json_str )?;
        extract_from_plugins_js( &data, &mut out, cfg );
    } else {
        let data: Value = serde_json::from_str( content )?;
        if is_locale_file( file_path ) {
            extract_from_locale( &data, &mut out );
        } else {
            walk( &data, "", &mut out, cfg );
        }
    }

    Ok( out )
}

/// Apply a path -> translated text map to one file's contents, returning
/// the new file contents (not yet written to disk).
#[ tracing::instrument( skip( content, translations ) ) ]
pub fn inject_translations(
    file_path: &str,
    content: &str,
    translations: &HashMap<String, String>,
) -> Result<String, JsonCoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok( content.to_string() );
    }

    if file_path.to_lowercase().ends_with( ".js" ) {
        let ( prefix, json_str, suffix ) = extract_js_json( trimmed )?;
        let mut data: Value = serde_json::from_str( &json_str )?;
        apply_generic( &mut data, translations );
        let new_json = serde_json::to_string( &data )?;
        return Ok( format!( "{prefix}{}{suffix}", harden_backslash_space( &new_json ) ) );
    }

    let mut data: Value = serde_json::from_str( trimmed )?;

    if is_locale_file( file_path ) {
        if let Some( map ) = data.as_object_mut() {
            for ( key, text ) in translations {
                if text.is_empty() {
                    continue;
                }
                if let Some( slot ) = map.get_mut( key ) {
                    *slot = Value::String( text.clone() );
                }
            }
        }
        return Ok( serde_json::to_string_pretty( &data )? );
    }

    apply_generic( &mut data, translations );
    Ok( serde_json::to_string_pretty( &data )? )
}


fn is_locale_file( file_path: &str ) -> bool {
    let normalized = file_path.replace( '\\', "/" ).to_lowercase();
    normalized.contains( "/locales/" ) && normalized.ends_with( ".json" )
}

fn join_path( base: &str, segment: &str ) -> String {
    if base.is_empty() { segment.to_string() } else { format!( "{base}.{segment}" ) }
}

fn try_parse_nested_json( s: &str ) -> Option<Value> {
    if !( s.starts_with( '{' ) || s.starts_with( '[' ) ) || s.chars().count() <= 2 {
        return None;
    }
    serde_json::from_str( s ).ok()
}


fn extract_from_locale( data: &Value, out: &mut Vec<ExtractedText> ) {
    let Some( map ) = data.as_object() else { return };
    for ( key, value ) in map {
        let Some( text ) = value.as_str() else { continue };
        if text.trim().chars().count() <= 1 {
            continue;
        }
        if is_technical_string( text ) {
            continue;
        }
        out.push( ExtractedText { path: key.clone(), text: text.to_string(), context: TextContext::System } );
    }
}

fn extract_from_plugins_js( data: &Value, out: &mut Vec<ExtractedText>, cfg: &ExtractConfig ) {
    let Some( arr ) = data.as_array() else { return };
    for ( i, plugin ) in arr.iter().enumerate() {
        let Some( params ) = plugin.as_object().and_then( |o| o.get( "parameters" ) ) else { continue };
        walk( params, &format!( "{i}.parameters" ), out, cfg );
    }
}


fn walk( value: &Value, path: &str, out: &mut Vec<ExtractedText>, cfg: &ExtractConfig ) {
    match value {
        Value::Object( map ) => process_object( map, path, out, cfg ),
        Value::Array( arr ) => process_array( arr, path, out, cfg ),
        Value::String( s ) => {
            if let Some( nested ) = try_parse_nested_json( s ) {
                walk( &nested, &join_path( path, "@JSON" ), out, cfg );
            }
        }
        _ => {}
    }
}

fn process_object( map: &Map<String, Value>, path: &str, out: &mut Vec<ExtractedText>, cfg: &ExtractConfig ) {
    let is_sound_obj = SOUND_OBJECT_KEYS.iter().all( |k| map.contains_key( *k ) );

    for ( key, value ) in map {
        if SKIP_FIELDS.contains( &key.as_str() ) && !( key == "note" && cfg.translate_notes ) {
            continue;
        }
        if is_sound_obj && key == "name" {
            continue;
        }

        let key_lower = key.to_lowercase();
        if CODE_KEY_SUFFIXES.iter().any( |s| key_lower.ends_with( s ) ) {
            continue;
        }

        let new_path = join_path( path, &path::encode_segment( key ) );

        if key == "note" && cfg.translate_notes {
            if let Some( note_text ) = value.as_str() {
                extract_note_field( note_text, &new_path, out );
                continue;
            }
        }

        if let Some( s ) = value.as_str() {
            if let Some( nested ) = try_parse_nested_json( s ) {
                walk( &nested, &join_path( &new_path, "@JSON" ), out, cfg );
                continue;
            }
        }

        let is_name_field = key == "name" && !is_sound_obj;
        let mut should_extract = false;

        if ( DATABASE_FIELD_WHITELIST.contains( &key.as_str() ) || is_name_field ) && value.is_string() {
            should_extract = true;
        } else if TEXT_KEY_SUFFIXES.iter().any( |s| key_lower.ends_with( s ) ) && value.is_string() {
            should_extract = true;
        } else if let Some( s ) = value.as_str() {
            let is_plugin_param = new_path.contains( ".parameters" )
                || new_path.contains( ".@JSON" )
                || path.contains( "parameters" );

            if is_plugin_param {
                let hint_match = ASSET_KEY_HINTS.iter().any( |h| key_lower.contains( h ) );
                if hint_match && looks_like_asset_name( s ) {
                    continue;
                }

                let dialogue = key != "note";
                if is_safe_to_translate_ctx( s, dialogue ) && !is_technical_string( s ) {
                    let has_space = s.contains( ' ' );
                    let has_non_ascii = s.chars().any( |c| !c.is_ascii() );
                    if has_space || has_non_ascii {
                        should_extract = true;
                    } else if TEXT_KEY_INDICATORS.iter().any( |t| key_lower.contains( t ) ) {
                        should_extract = true;
                    }
                }
            }
        }

        if should_extract {
            let text = value.as_str().unwrap_or_default().to_string();
            let mut context = if new_path.contains( ".parameters" )
                || matches!( key.as_str(), "message1" | "message2" | "message3" | "message4" | "help" | "description" )
            {
                TextContext::Dialogue
            } else {
                TextContext::Name
            };
            if matches!( key.as_str(), "name" | "nickname" | "gameTitle" | "title" | "currencyUnit" ) {
                context = TextContext::Name;
            }
            out.push( ExtractedText { path: new_path, text, context } );
            continue;
        }

        if SYSTEM_TERM_KEYS.contains( &key.as_str() ) {
            extract_system_terms( value, &new_path, out );
            continue;
        }

        walk( value, &new_path, out, cfg );
    }
}

fn process_array( arr: &[Value], path: &str, out: &mut Vec<ExtractedText>, cfg: &ExtractConfig ) {
    let mut i = 0;
    while i < arr.len() {
        let item = &arr[ i ];
        let new_path = join_path( path, &i.to_string() );

        if let Some( obj ) = item.as_object() {
            if obj.contains_key( "code" ) && obj.contains_key( "parameters" ) {
                let code = obj.get( "code" ).and_then( Value::as_i64 ).unwrap_or( -1 );

                if code == event_code::SCRIPT {
                    let mut j = i + 1;
                    while command_code( arr, j ) == Some( event_code::SCRIPT_CONT ) {
                        j += 1;
                    }
                    process_script_block( &arr[ i..j ], path, i, out );
                    i = j;
                    continue;
                }

                if code == event_code::PLUGIN_COMMAND_MZ {
                    let mut j = i + 1;
                    while command_code( arr, j ) == Some( event_code::PLUGIN_COMMAND_MZ_CONT ) {
                        j += 1;
                    }
                    process_mz_plugin_block( &arr[ i..j ], path, i, out, cfg );
                    i = j;
                    continue;
                }

                if code == event_code::SCRIPT_CONT || code == event_code::PLUGIN_COMMAND_MZ_CONT {
                    i += 1;
                    continue;
                }

                process_event_command( obj, code, &new_path, out, cfg );
                i += 1;
                continue;
            }
        }

        if let Some( s ) = item.as_str() {
            if let Some( nested ) = try_parse_nested_json( s ) {
                walk( &nested, &join_path( &new_path, "@JSON" ), out, cfg );
                i += 1;
                continue;
            }
        }

        walk( item, &new_path, out, cfg );
        i += 1;
    }
}

fn command_code( arr: &[Value], idx: usize ) -> Option<i64> {
    arr.get( idx )?.as_object()?.get( "code" )?.as_i64()
}

fn text_at( path: &str, idx: usize, text: &str, context: TextContext ) -> ExtractedText {
    ExtractedText { path: format!( "{path}.parameters.{idx}" ), text: text.to_string(), context }
}

fn process_event_command(
    obj: &Map<String, Value>,
    code: i64,
    path: &str,
    out: &mut Vec<ExtractedText>,
    cfg: &ExtractConfig,
) {
    let Some( params ) = obj.get( "parameters" ).and_then( Value::as_array ) else { return };

    if code == event_code::SHOW_TEXT_LINE || code == event_code::SCROLL_TEXT_LINE {
        if let Some( s ) = params.first().and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, true ) {
                out.push( text_at( path, 0, s, TextContext::Dialogue ) );
            }
        }
    } else if code == event_code::SHOW_TEXT_HEADER {
        if let Some( s ) = params.get( 4 ).and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, true ) {
                out.push( text_at( path, 4, s, TextContext::Name ) );
            }
        }
    } else if code == event_code::SCROLL_TEXT_HEADER {
        if let Some( s ) = params.get( 2 ).and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, true ) {
                out.push( text_at( path, 2, s, TextContext::System ) );
            }
        }
    } else if code == event_code::SHOW_CHOICES {
        if let Some( choices ) = params.first().and_then( Value::as_array ) {
            for ( ci, choice ) in choices.iter().enumerate() {
                if let Some( s ) = choice.as_str() {
                    if is_safe_to_translate_ctx( s, true ) {
                        out.push( ExtractedText {
                            path: format!( "{path}.parameters.0.{ci}" ),
                            text: s.to_string(),
                            context: TextContext::Choice,
                        } );
                    }
                }
            }
        }
    } else if code == event_code::WHEN_CHOICE_LABEL {
        if let Some( s ) = params.get( 1 ).and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, true ) {
                out.push( text_at( path, 1, s, TextContext::Choice ) );
            }
        }
    } else if ( code == event_code::COMMENT || code == event_code::COMMENT_CONT ) && cfg.translate_comments {
        if let Some( s ) = params.first().and_then( Value::as_str ) {
            let text = s.trim();
            if is_safe_to_translate_ctx( text, false )
                && !text.is_empty() && !text.starts_with( '<' ) && !text.starts_with( "::" )
                && ( text.contains( ' ' ) || text.chars().count() > 20 )
            {
                out.push( text_at( path, 0, s, TextContext::Comment ) );
            }
        }
    } else if matches!( code, event_code::CHANGE_NAME | event_code::CHANGE_NICKNAME | event_code::CHANGE_PROFILE ) {
        if let Some( s ) = params.get( 1 ).and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, false ) {
                out.push( text_at( path, 1, s, TextContext::Name ) );
            }
        }
    } else if code == event_code::PLUGIN_COMMAND_MV {
        if let Some( s ) = params.first().and_then( Value::as_str ) {
            if is_safe_to_translate_ctx( s, false ) && ( s.contains( '"' ) || s.chars().count() > 50 ) {
                out.push( text_at( path, 0, s, TextContext::Dialogue ) );
            }
        }
    } else if code == event_code::PLUGIN_COMMAND_MZ && params.len() >= 4 {
        if let Some( s ) = params[ 2 ].as_str() {
            if is_safe_to_translate_ctx( s, false ) {
                out.push( text_at( path, 2, s, TextContext::Dialogue ) );
            }
        }
        if let Some( args ) = params[ 3 ].as_object() {
            process_object( args, &format!( "{path}.parameters.3" ), out, cfg );
        }
    }
}

fn process_script_block( commands: &[Value], list_path: &str, start_index: usize, out: &mut Vec<ExtractedText> ) {
    let lines: Vec<String> = commands.iter()
        .map( |cmd| {
            cmd.get( "parameters" ).and_then( Value::as_array )
                .and_then( |p| p.first() )
                .and_then( Value::as_str )
                .unwrap_or( "" )
                .to_string()
        } )
        .collect();
    let merged = lines.join( "\n" );
    if merged.trim().is_empty() {
        return;
    }

    let line_count = commands.len() - 1;
    let base_path = join_path( list_path, &start_index.to_string() );

    for ( idx, tok ) in js_tokenizer::extract_translatable_strings( &merged ).into_iter().enumerate() {
        if !is_safe_to_translate_ctx( &tok.value, true ) {
            continue;
        }
        let path = if line_count > 0 {
            format!( "{base_path}.@SCRIPTMERGE{line_count}.@JS{idx}" )
        } else {
            format!( "{base_path}.parameters.0.@JS{idx}" )
        };
        out.push( ExtractedText { path, text: tok.value, context: TextContext::Dialogue } );
    }
}

fn process_mz_plugin_block(
    commands: &[Value],
    list_path: &str,
    start_index: usize,
    out: &mut Vec<ExtractedText>,
    cfg: &ExtractConfig,
) {
    let base_path = join_path( list_path, &start_index.to_string() );

    if let Some( first ) = commands[ 0 ].as_object() {
        let code = first.get( "code" ).and_then( Value::as_i64 ).unwrap_or( -1 );
        process_event_command( first, code, &base_path, out, cfg );
    }

    for ( j, cmd ) in commands.iter().enumerate().skip( 1 ) {
        let cmd_path = join_path( list_path, &( start_index + j ).to_string() );
        let Some( params ) = cmd.as_object().and_then( |o| o.get( "parameters" ) ).and_then( Value::as_array )
        else { continue };
        if params.is_empty() {
            continue;
        }

        if let Some( s ) = params[ 0 ].as_str() {
            if is_safe_to_translate_ctx( s, true ) {
                out.push( ExtractedText {
                    path: format!( "{cmd_path}.parameters.0" ),
                    text: s.to_string(),
                    context: TextContext::Dialogue,
                } );
            }
        }

        for ( p_idx, param ) in params.iter().enumerate() {
            if let Some( map ) = param.as_object() {
                process_object( map, &format!( "{cmd_path}.parameters.{p_idx}" ), out, cfg );
            }
        }
    }
}

fn extract_system_terms( value: &Value, path: &str, out: &mut Vec<ExtractedText> ) {
    match value {
        Value::Array( arr ) => {
            for ( i, item ) in arr.iter().enumerate() {
                if let Some( s ) = item.as_str() {
                    if is_safe_to_translate_ctx( s, true ) {
                        out.push( ExtractedText {
                            path: format!( "{path}.{i}" ), text: s.to_string(), context: TextContext::System,
                        } );
                    }
                }
            }
        }
        Value::Object( map ) => {
            for ( key, value ) in map {
                let safe_key = path::encode_segment( key );
                if let Some( s ) = value.as_str() {
                    if is_safe_to_translate_ctx( s, true ) {
                        out.push( ExtractedText {
                            path: format!( "{path}.{safe_key}" ), text: s.to_string(), context: TextContext::System,
                        } );
                        continue;
                    }
                }
                if let Value::Array( arr ) = value {
                    for ( i, item ) in arr.iter().enumerate() {
                        if let Some( s ) = item.as_str() {
                            if is_safe_to_translate_ctx( s, true ) {
                                out.push( ExtractedText {
                                    path: format!( "{path}.{safe_key}.{i}" ),
                                    text: s.to_string(),
                                    context: TextContext::System,
                                } );
                            }
                        }
                    }
                }
            }
        }
        _ => {}
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


/// Locate `var $plugins = [...]`'s JSON literal via brace counting (a
/// string-literal-aware scan, not a regex, since the literal may embed
/// `{`/`}`/`[`/`]` inside quoted plugin parameter values).
fn extract_js_json( content: &str ) -> Result<( String, String, String ), JsonCoreError> {
    let Some( marker_idx ) = content.find( "var $plugins" ) else {
        return Err( JsonCoreError::NoPluginsPrelude );
    };
    let Some( eq_rel ) = content[ marker_idx.. ].find( '=' ) else {
        return Err( JsonCoreError::NoPluginsPrelude );
    };

    let bytes = content.as_bytes();
    let mut i = marker_idx + eq_rel + 1;
    let mut json_start = None;
    while i < bytes.len() {
        let c = bytes[ i ];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == b'[' || c == b'{' {
            json_start = Some( i );
        }
        break;
    }
    let Some( json_start ) = json_start else { return Err( JsonCoreError::NoPluginsPrelude ) };

    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut quote_char = 0u8;
    let mut escape = false;
    let mut json_end = None;

    let mut j = json_start;
    while j < bytes.len() {
        let c = bytes[ j ];
        if in_string {
            if escape {
                escape = false;
            } else if c == b'\\' {
                escape = true;
            } else if c == quote_char {
                in_string = false;
            }
        } else {
            match c {
                b'"' | b'\'' => { in_string = true; quote_char = c; }
                b'[' | b'{' => stack.push( c ),
                b']' => {
                    if stack.last() != Some( &b'[' ) {
                        return Err( JsonCoreError::UnbalancedPluginsLiteral );
                    }
                    stack.pop();
                    if stack.is_empty() {
                        json_end = Some( j + 1 );
                        break;
                    }
                }
                b'}' => {
                    if stack.last() != Some( &b'{' ) {
                        return Err( JsonCoreError::UnbalancedPluginsLiteral );
                    }
                    stack.pop();
                    if stack.is_empty() {
                        json_end = Some( j + 1 );
                        break;
                    }
                }
                _ => {}
            }
        }
        j += 1;
    }

    let Some( json_end ) = json_end else { return Err( JsonCoreError::UnbalancedPluginsLiteral ) };

    Ok( ( content[ ..json_start ].to_string(), content[ json_start..json_end ].to_string(), content[ json_end.. ].to_string() ) )
}

/// Doubles a lone backslash immediately before a space in the
/// re-serialized `plugins.js` JSON literal, a shape the syntax-polish
/// pass in `placeholder::restore` can leave behind and that some
/// minifier configurations choke on.
fn harden_backslash_space( s: &str ) -> String {
    s.replace( "\\ ", "\\\\ " )
}


fn apply_generic( data: &mut Value, translations: &HashMap<String, String> ) {
    let mut nested_updates: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut script_updates: HashMap<String, Vec<( usize, usize, String )>> = HashMap::new();
    let mut note_updates: HashMap<String, Vec<( usize, String )>> = HashMap::new();
    let mut direct_updates: Vec<( String, String )> = Vec::new();

    for ( path, text ) in translations {
        if let Some( idx ) = path.find( ".@JSON" ) {
            let root = path[ ..idx ].to_string();
            let rest = path[ idx + ".@JSON".len().. ].trim_start_matches( '.' ).to_string();
            nested_updates.entry( root ).or_default().insert( rest, text.clone() );
        } else if let Some( idx ) = find_note_marker( path ) {
            let ( root, seg_index ) = idx;
            note_updates.entry( root ).or_default().push( ( seg_index, text.clone() ) );
        } else if let Some( idx ) = path.find( ".@JS" ) {
            if let Some( merge_idx ) = path.find( ".@SCRIPTMERGE" ) {
                let base_path = path[ ..merge_idx ].to_string();
                let rest = &path[ merge_idx + ".@SCRIPTMERGE".len().. ];
                let Some( js_idx ) = rest.find( ".@JS" ) else { continue };
                let Ok( line_count ) = rest[ ..js_idx ].parse::<usize>() else { continue };
                let Ok( js_index ) = rest[ js_idx + ".@JS".len().. ].parse::<usize>() else { continue };
                script_updates.entry( base_path ).or_default().push( ( line_count, js_index, text.clone() ) );
            } else {
                let before_js = &path[ ..idx ];
                let base_path = before_js.strip_suffix( ".parameters.0" ).unwrap_or( before_js ).to_string();
                let Ok( js_index ) = path[ idx + ".@JS".len().. ].parse::<usize>() else { continue };
                script_updates.entry( base_path ).or_default().push( ( 0, js_index, text.clone() ) );
            }
        } else {
            direct_updates.push( ( path.clone(), text.clone() ) );
        }
    }

    for ( path, text ) in direct_updates {
        if text.is_empty() {
            continue;
        }
        let segments = path::decode_path( &path );
        path::set( data, &segments, Value::String( text ) );
    }

    for ( root_path, nested_trans ) in nested_updates {
        apply_nested_json_translation( data, &root_path, &nested_trans );
    }

    for ( root_path, updates ) in note_updates {
        apply_note_translation( data, &root_path, &updates );
    }

    for ( base_path, updates ) in script_updates {
        apply_script_translation( data, &base_path, &updates );
    }
}

fn find_note_marker( path: &str ) -> Option<( String, usize )> {
    for marker in [ ".@NOTEBLOCK_", ".@NOTEINLINE_" ] {
        if let Some( idx ) = path.find( marker ) {
            let root = path[ ..idx ].to_string();
            let index_str = &path[ idx + marker.len().. ];
            if let Ok( seg_index ) = index_str.parse::<usize>() {
                return Some( ( root, seg_index ) );
            }
        }
    }
    None
}

fn apply_note_translation( data: &mut Value, root_path: &str, updates: &[( usize, String )] ) {
    let segments = path::decode_path( root_path );
    let Some( current ) = path::get( data, &segments ) else { return };
    let Some( note_text ) = current.as_str() else { return };
    let note_text = note_text.to_string();

    let originals: Vec<String> = note_tag::parse_note( &note_text ).into_iter()
        .filter( |s| s.translatable && !s.text.is_empty() )
        .map( |s| s.text )
        .collect();

    let mut translations = HashMap::new();
    for ( idx, translated ) in updates {
        if translated.is_empty() {
            continue;
        }
        if let Some( original ) = originals.get( *idx ) {
            translations.insert( original.clone(), translated.clone() );
        }
    }
    if translations.is_empty() {
        return;
    }

    let rebuilt = note_tag::rebuild_note( &note_text, &translations );
    path::set( data, &segments, Value::String( rebuilt ) );
}

fn apply_nested_json_translation( data: &mut Value, root_path: &str, nested_trans: &HashMap<String, String> ) {
    let segments = path::decode_path( root_path );
    let Some( current ) = path::get( data, &segments ) else { return };
    let Some( json_str ) = current.as_str() else { return };
    let Ok( mut nested ) = serde_json::from_str::<Value>( json_str ) else { return };

    let mut deeper: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut direct: HashMap<String, String> = HashMap::new();

    for ( sub_path, text ) in nested_trans {
        if let Some( idx ) = sub_path.find( ".@JSON" ) {
            let inner_root = sub_path[ ..idx ].to_string();
            let inner_rest = sub_path[ idx + ".@JSON".len().. ].trim_start_matches( '.' ).to_string();
            deeper.entry( inner_root ).or_default().insert( inner_rest, text.clone() );
        } else {
            direct.insert( sub_path.clone(), text.clone() );
        }
    }

    for ( sub_path, text ) in &direct {
        if text.is_empty() {
            continue;
        }
        let sub_segments = path::decode_path( sub_path );
        path::set( &mut nested, &sub_segments, Value::String( text.clone() ) );
    }

    for ( inner_root, inner_trans ) in &deeper {
        apply_nested_json_translation( &mut nested, inner_root, inner_trans );
    }

    let Ok( new_json_str ) = serde_json::to_string( &nested ) else { return };
    path::set( data, &segments, Value::String( new_json_str ) );
}

fn apply_script_translation( data: &mut Value, base_path: &str, updates: &[( usize, usize, String )] ) {
    let Some( ( list_path, cmd_index_str ) ) = base_path.rsplit_once( '.' ) else { return };
    let Ok( cmd_index ) = cmd_index_str.parse::<usize>() else { return };

    let list_segments = path::decode_path( list_path );
    let Some( event_list ) = path::get_mut( data, &list_segments ).and_then( Value::as_array_mut ) else { return };

    let line_count = updates.iter().map( |( lc, _, _ )| *lc ).max().unwrap_or( 0 );
    let end = ( cmd_index + 1 + line_count ).min( event_list.len() );
    if cmd_index >= end {
        return;
    }

    let lines: Vec<String> = event_list[ cmd_index..end ].iter()
        .map( |cmd| {
            cmd.get( "parameters" ).and_then( Value::as_array )
                .and_then( |p| p.first() )
                .and_then( Value::as_str )
                .unwrap_or( "" )
                .to_string()
        } )
        .collect();
    let mut merged = lines.join( "\n" );

    let strings = js_tokenizer::extract_translatable_strings( &merged );

    let mut sorted_updates: Vec<&( usize, usize, String )> = updates.iter().collect();
    sorted_updates.sort_by( |a, b| b.1.cmp( &a.1 ) );

    for ( _line_count, js_index, text ) in sorted_updates {
        if text.is_empty() {
            continue;
        }
        let Some( tok ) = strings.get( *js_index ) else { continue };
        merged = js_tokenizer::replace_string_at( &merged, tok, text );
    }

    let new_lines: Vec<&str> = merged.split( '\n' ).collect();
    for ( k, cmd ) in event_list[ cmd_index..end ].iter_mut().enumerate() {
        let Some( params ) = cmd.get_mut( "parameters" ).and_then( Value::as_array_mut ) else { continue };
        let Some( slot ) = params.get_mut( 0 ) else { continue };
        *slot = Value::String( new_lines.get( k ).copied().unwrap_or( "" ).to_string() );
    }
}


#[ cfg( test ) ]
mod tests {
    use super::*;
    use serde_json::json;

    #[ test ]
    fn extracts_show_text_and_actor_name() {
        let data = json!( [
            { "id": 1, "name": "Hero", "faceName": "Actor1" },
        ] );
        let mut out = Vec::new();
        walk( &data, "", &mut out, &ExtractConfig::default() );
        assert!( out.iter().any( |e| e.text == "Hero" && e.path == "0.name" ) );
        assert!( !out.iter().any( |e| e.text == "Actor1" ) );
    }

    #[ test ]
    fn extracts_event_command_show_text() {
        let cmd = json!( { "code": 401, "parameters": [ "Hello there, friend!" ] } ).as_object().unwrap().clone();
        let mut out = Vec::new();
        process_event_command( &cmd, 401, "events.0.list.0", &mut out, &ExtractConfig::default() );
        assert_eq!( out.len(), 1 );
        assert_eq!( out[ 0 ].path, "events.0.list.0.parameters.0" );
    }

    #[ test ]
    fn recurses_into_nested_json_string() {
        let data = json!( { "config": "{\"title\": \"Deep Title Text\"}" } );
        let mut out = Vec::new();
        walk( &data, "", &mut out, &ExtractConfig::default() );
        assert!( out.iter().any( |e| e.text == "Deep Title Text" && e.path == "config.@JSON.title" ) );
    }

    #[ test ]
    fn merges_script_continuation_lines_and_extracts_strings() {
        let arr = vec![
            json!( { "code": 355, "parameters": [ "$gameMessage.add(\"Part one of a tale\");" ] } ),
            json!( { "code": 655, "parameters": [ "$gameMessage.add(\"and part two.\");" ] } ),
        ];
        let mut out = Vec::new();
        process_array( &arr, "list", &mut out, &ExtractConfig::default() );
        assert!( out.iter().any( |e| e.text == "Part one of a tale" ) );
        assert!( out.iter().any( |e| e.text == "and part two." ) );
        assert!( out.iter().all( |e| e.path.contains( "@SCRIPTMERGE1" ) ) );
    }

    #[ test ]
    fn direct_injection_round_trip() {
        let mut data = json!( [ { "id": 1, "name": "Hero" } ] );
        let mut translations = HashMap::new();
        translations.insert( "0.name".to_string(), "Heros".to_string() );
        apply_generic( &mut data, &translations );
        assert_eq!( data[ 0 ][ "name" ], "Heros" );
    }

    #[ test ]
    fn nested_json_injection_round_trip() {
        let mut data = json!( { "config": "{\"title\":\"Old Title\"}" } );
        let mut translations = HashMap::new();
        translations.insert( "config.@JSON.title".to_string(), "New Title".to_string() );
        apply_generic( &mut data, &translations );
        let nested: Value = serde_json::from_str( data[ "config" ].as_str().unwrap() ).unwrap();
        assert_eq!( nested[ "title" ], "New Title" );
    }

    #[ test ]
    fn script_merge_injection_round_trip() {
        let mut data = json!( [
            { "code": 355, "parameters": [ "$gameMessage.add(\"Part one of a tale\");" ] },
            { "code": 655, "parameters": [ "$gameMessage.add(\"and part two.\");" ] },
        ] );
        let mut translations = HashMap::new();
        translations.insert( "0.@SCRIPTMERGE1.@JS0".to_string(), "Premiere partie".to_string() );
        translations.insert( "0.@SCRIPTMERGE1.@JS1".to_string(), "et seconde partie.".to_string() );
        apply_generic( &mut data, &translations );
        assert!( data[ 0 ][ "parameters" ][ 0 ].as_str().unwrap().contains( "Premiere partie" ) );
        assert!( data[ 1 ][ "parameters" ][ 0 ].as_str().unwrap().contains( "et seconde partie." ) );
    }

    #[ test ]
    fn locale_file_extraction_and_injection() {
        let content = r#"{"greeting": "Hello, world!", "short": "x"}"#;
        let extracted = extract_text( "project/locales/en.json", content, &ExtractConfig::default() ).unwrap();
        assert!( extracted.iter().any( |e| e.path == "greeting" ) );
        assert!( !extracted.iter().any( |e| e.path == "short" ) );

        let mut translations = HashMap::new();
        translations.insert( "greeting".to_string(), "Bonjour le monde !".to_string() );
        let injected = inject_translations( "project/locales/en.json", content, &translations ).unwrap();
        assert!( injected.contains( "Bonjour le monde !" ) );
    }

    #[ test ]
    fn plugins_js_extraction_and_injection_round_trip() {
        let content = r#"var $plugins = [{"name":"Foo","status":true,"parameters":{"text":"Hello there!"}}];"#;
        let extracted = extract_text( "www/js/plugins.js", content, &ExtractConfig::default() ).unwrap();
        assert!( extracted.iter().any( |e| e.text == "Hello there!" ) );

        let mut translations = HashMap::new();
        translations.insert( extracted[ 0 ].path.clone(), "Bonjour !".to_string() );
        let injected = inject_translations( "www/js/plugins.js", content, &translations ).unwrap();
        assert!( injected.starts_with( "var $plugins" ) );
        assert!( injected.contains( "Bonjour !" ) );
    }

    #[ test ]
    fn note_field_extraction_requires_opt_in() {
        let data = json!( { "note": "<description>\nA brave hero.\n</description>" } );
        let mut out = Vec::new();
        walk( &data, "", &mut out, &ExtractConfig::default() );
        assert!( out.is_empty() );

        let cfg = ExtractConfig { translate_notes: true, translate_comments: true };
        let mut out = Vec::new();
        walk( &data, "", &mut out, &cfg );
        assert!( out.iter().any( |e| e.text == "A brave hero." ) );
    }
}
