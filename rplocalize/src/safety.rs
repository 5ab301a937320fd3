//! Shared "is this string actually text" heuristic (spec §4.5/§4.6
//! both call into one filter so the two extractors never drift).
//!
//! Grounded on `original_source/src/core/parsers/base.py`
//! (`BaseParser.is_safe_to_translate`).

const IGNORED_EXTENSIONS: &[ &str ] = &[
    ".ogg", ".m4a", ".wav", ".mp3", ".mid",
    ".png", ".jpg", ".jpeg", ".bmp", ".gif", ".svg", ".tga",
    ".webm", ".mp4", ".avi", ".mov",
    ".rpgmvp", ".rpgmvo", ".rpgmvm", ".rpgmvw",
    ".css", ".js", ".json", ".txt", ".map", ".bin",
    ".rvdata2", ".rxdata", ".rvdata",
];

const IGNORED_PREFIXES: &[ &str ] = &[
    "v[", "n[", "i[", "<", "::", "eval(", "script:", "plugin:",
];

/// Returns true when `text` looks like natural-language content rather
/// than a filename, path, internal key, or asset id.
///
/// `is_dialogue` relaxes the asset-id heuristics (Show Text content is
/// already known to be prose, so something like `"Attack1"` should not
/// be rejected just because it ends in a digit).
#[ tracing::instrument( skip( text ) ) ]
pub fn is_safe_to_translate( text: &str ) -> bool {
    is_safe_to_translate_ctx( text, false )
}

pub fn is_safe_to_translate_ctx( text: &str, is_dialogue: bool ) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    let lower = trimmed.to_lowercase();

    if IGNORED_EXTENSIONS.iter().any( |ext| lower.ends_with( ext ) ) {
        return false;
    }

    if ( trimmed.contains( '/' ) || trimmed.contains( '\\' ) ) && !trimmed.contains( ' ' ) {
        return false;
    }

    if !trimmed.contains( ' ' ) {
        if trimmed.contains( '_' ) {
            return false;
        }

        if !is_dialogue {
            if trimmed.chars().any( |c| c.is_ascii_digit() ) {
                return false;
            }
            let rest_has_upper = trimmed.chars().skip( 1 ).any( |c| c.is_uppercase() );
            let has_lower = trimmed.chars().any( |c| c.is_lowercase() );
            if rest_has_upper && has_lower {
                return false;
            }
        }

        if trimmed.chars().count() < 2 && trimmed.is_ascii() {
            return false;
        }
    }

    let clean_num: String = trimmed.chars()
        .filter( |c| !matches!( c, '.' | '-' | ' ' ) )
        .collect();
    if !clean_num.is_empty() && clean_num.chars().all( |c| c.is_ascii_digit() ) {
        return false;
    }

    if !is_dialogue && IGNORED_PREFIXES.iter().any( |p| lower.starts_with( p ) ) {
        return false;
    }

    true
}


const JS_CODE_MARKERS: &[ &str ] = &[
    "return ", "return;", "function(", "function (",
    "const ", "var ", "let ", "this.", "new ",
    "=>", "===", "!==", "&&", "||",
    ".call(", ".apply(", ".bind(",
    "Math.", "Graphics.", "Window_", "Scene_", "Game_",
    "Sprite_", "Bitmap.", "bitmap.",
    "SceneManager.", "BattleManager.", "TextManager.",
    "$gameVariables", "$gameSwitches", "$gameParty",
    "$dataSystem", "$dataActors", "$dataItems",
];

/// Narrower than [`is_safe_to_translate`]: also rejects CSS colors,
/// booleans, and JavaScript-looking snippets, for the plugin-parameter
/// heuristic in `json_core` where `is_safe_to_translate` alone passes
/// too much JS source text through.
pub fn is_technical_string( text: &str ) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if matches!( lower.as_str(), "true" | "false" | "on" | "off" | "null" | "undefined" | "none" | "" ) {
        return true;
    }

    if IGNORED_EXTENSIONS.iter()
        .filter( |ext| !matches!( **ext, ".js" | ".json" | ".css" | ".txt" ) )
        .any( |ext| lower.ends_with( ext ) )
    {
        return true;
    }

    let clean: String = trimmed.chars().filter( |c| !matches!( c, ',' | '.' | ' ' ) ).collect();
    let clean = clean.strip_prefix( '-' ).unwrap_or( &clean );
    if !clean.is_empty() && clean.chars().all( |c| c.is_ascii_digit() ) {
        return true;
    }

    if trimmed.starts_with( '#' ) && matches!( trimmed.chars().count(), 4 | 5 | 7 | 9 ) {
        return true;
    }
    if lower.starts_with( "rgb(" ) || lower.starts_with( "rgba(" ) {
        return true;
    }

    if JS_CODE_MARKERS.iter().any( |kw| trimmed.contains( kw ) ) {
        return true;
    }

    if trimmed.trim_end().ends_with( ';' ) && ( trimmed.contains( '(' ) || trimmed.contains( '.' ) ) {
        return true;
    }
    let starts_control = [ "if(", "if (", "for(", "for (", "while(" ]
        .iter().any( |p| trimmed.trim_start().starts_with( p ) );
    if starts_control {
        return true;
    }

    false
}

/// True when `text` looks like a bare asset/file identifier (no
/// whitespace, only filename-safe characters).
pub fn looks_like_asset_name( text: &str ) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains( ' ' ) || trimmed.contains( '\n' ) || trimmed.contains( '\t' ) {
        return false;
    }
    trimmed.chars().all( |c| c.is_ascii_alphanumeric() || matches!( c, '_' | '.' | '/' | '-' ) )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn rejects_asset_filenames() {
        assert!( !is_safe_to_translate( "Actor1.png" ) );
        assert!( !is_safe_to_translate( "bgm/Battle1.ogg" ) );
    }

    #[ test ]
    fn rejects_technical_identifiers() {
        assert!( !is_safe_to_translate( "player_hp" ) );
        assert!( !is_safe_to_translate( "actor1" ) );
        assert!( !is_safe_to_translate( "camelCaseKey" ) );
        assert!( !is_safe_to_translate( "42" ) );
        assert!( !is_safe_to_translate( "-3.5" ) );
    }

    #[ test ]
    fn accepts_prose() {
        assert!( is_safe_to_translate( "Hello, traveler!" ) );
        assert!( is_safe_to_translate( "勇者" ) );
    }

    #[ test ]
    fn dialogue_context_relaxes_asset_id_shape() {
        assert!( !is_safe_to_translate_ctx( "Attack1", false ) );
        assert!( is_safe_to_translate_ctx( "Attack1", true ) );
    }

    #[ test ]
    fn rejects_engine_prefixes() {
        assert!( !is_safe_to_translate( "eval(1+1)" ) );
        assert!( !is_safe_to_translate( "Script: foo" ) );
    }

    #[ test ]
    fn technical_string_rejects_js_snippets_and_colors() {
        assert!( is_technical_string( "this.update();" ) );
        assert!( is_technical_string( "#ff00ff" ) );
        assert!( is_technical_string( "true" ) );
        assert!( !is_technical_string( "Hello, traveler!" ) );
    }

    #[ test ]
    fn asset_name_detection() {
        assert!( looks_like_asset_name( "people/Actor1" ) );
        assert!( !looks_like_asset_name( "Hello there" ) );
    }
}
