//! Note-tag parser for Actor/Enemy/Item/Skill/State `<note>` fields
//!.
//!
//! Grounded on `original_source/src/core/parsers/note_tag_parser.py`
//! (`NoteTagParser`): the same three tag shapes, the same whitelist vs.
//! skip-list judgment, generalized from the Python original's
//! plugin-specific tag names to the shared [`crate::lore`] lists.

use std::sync::LazyLock;

use regex::Regex;

use crate::lore::{ NOTE_TAG_SKIP_LIST, NOTE_TAG_TEXT_WHITELIST };

/// `<TagName: value>`
static VALUE_TAG: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( r"(?is)<\s*([^<>:]+?)\s*:\s*([^<>]+?)\s*>" ).unwrap()
} );

/// `<TagName>...content...</TagName>` (non-greedy, spans newlines)
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( r"(?is)<\s*([^<>/]+?)\s*>(.*?)</\s*([^<>/]+?)\s*>" ).unwrap()
} );

/// `<TagName>` with no matching close, standing alone.
static SINGLE_TAG: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( r"(?is)<\s*([^<>:]+?)\s*>" ).unwrap()
} );


#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub enum SegmentKind {
    ValueTag,
    BlockTag,
    SingleTag,
    FreeText,
}

#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
    pub translatable: bool,
}


/// Split a note field into typed segments, in source order.
#[ tracing::instrument( skip( note_text ) ) ]
pub fn parse_note( note_text: &str ) -> Vec<Segment> {
    if note_text.trim().is_empty() {
        return Vec::new();
    }

    let mut used_ranges: Vec<( usize, usize )> = Vec::new();
    let mut ordered: Vec<( usize, Segment )> = Vec::new();

    for caps in BLOCK_TAG.captures_iter( note_text ) {
        let whole = caps.get( 0 ).unwrap();
        // Only treat it as a block tag if open/close names actually match.
        let open_name = caps.get( 1 ).unwrap().as_str().trim();
        let close_name = caps.get( 3 ).unwrap().as_str().trim();
        if !open_name.eq_ignore_ascii_case( close_name ) {
            continue;
        }
        let content = caps.get( 2 ).unwrap().as_str().trim();

        let tag_lower = open_name.to_lowercase();
        let is_text = NOTE_TAG_TEXT_WHITELIST.contains( &tag_lower.as_str() )
            || ( !content.is_empty() && looks_like_text( content ) );

        used_ranges.push( ( whole.start(), whole.end() ) );
        ordered.push( ( whole.start(), Segment {
            text: content.to_string(),
            kind: SegmentKind::BlockTag,
            translatable: is_text,
        } ) );
    }

    for caps in VALUE_TAG.captures_iter( note_text ) {
        let whole = caps.get( 0 ).unwrap();
        if in_ranges( whole.start(), &used_ranges ) {
            continue;
        }

        let tag_name = caps.get( 1 ).unwrap().as_str().trim();
        let value = caps.get( 2 ).unwrap().as_str().trim();
        let tag_lower = tag_name.to_lowercase();

        let is_text = if NOTE_TAG_TEXT_WHITELIST.contains( &tag_lower.as_str() ) {
            true
        } else if NOTE_TAG_SKIP_LIST.contains( &tag_lower.as_str() ) {
            false
        } else {
            looks_like_text( value )
        };

        used_ranges.push( ( whole.start(), whole.end() ) );
        ordered.push( ( whole.start(), Segment {
            text: value.to_string(),
            kind: SegmentKind::ValueTag,
            translatable: is_text,
        } ) );
    }

    for m in SINGLE_TAG.find_iter( note_text ) {
        if in_ranges( m.start(), &used_ranges ) {
            continue;
        }
        used_ranges.push( ( m.start(), m.end() ) );
        // Single self-closing tags carry no text of their own.
    }

    used_ranges.sort_unstable();
    let mut pos = 0;
    for &( start, end ) in &used_ranges {
        if pos < start {
            let text = note_text[ pos..start ].trim();
            if !text.is_empty() {
                ordered.push( ( pos, Segment {
                    text: text.to_string(),
                    kind: SegmentKind::FreeText,
                    translatable: looks_like_text( text ),
                } ) );
            }
        }
        pos = end.max( pos );
    }
    if pos < note_text.len() {
        let text = note_text[ pos.min( note_text.len() ).. ].trim();
        if !text.is_empty() {
            ordered.push( ( pos, Segment {
                text: text.to_string(),
                kind: SegmentKind::FreeText,
                translatable: looks_like_text( text ),
            } ) );
        }
    }

    ordered.sort_by_key( |( pos, _ )| *pos );
    ordered.into_iter().map( |( _, seg )| seg ).collect()
}

fn in_ranges( pos: usize, ranges: &[ ( usize, usize ) ] ) -> bool {
    ranges.iter().any( |&( s, e )| s <= pos && pos < e )
}

fn looks_like_text( value: &str ) -> bool {
    if value.is_empty() {
        return false;
    }
    if value.contains( ' ' ) && value.chars().count() > 3 {
        return true;
    }
    if value.chars().any( |c| !c.is_ascii() ) {
        return true;
    }
    if value.chars().any( |c| "!?.,:;".contains( c ) ) {
        return value.chars().count() > 2;
    }
    let mut chars = value.chars();
    if let Some( first ) = chars.next() {
        if first.is_uppercase() && value.chars().count() > 5 {
            return true;
        }
    }
    false
}


/// Collect only the translatable segment text, in order.
#[ tracing::instrument( skip( note_text ) ) ]
pub fn extract_translatable( note_text: &str ) -> Vec<String> {
    parse_note( note_text ).into_iter()
        .filter( |seg| seg.translatable && !seg.text.is_empty() )
        .map( |seg| seg.text )
        .collect()
}


/// Rebuild a note field, swapping in `translations[original] ->
/// translated` wherever the original segment text matches.
#[ tracing::instrument( skip( note_text, translations ) ) ]
pub fn rebuild_note( note_text: &str, translations: &std::collections::HashMap<String, String> ) -> String {
    if translations.is_empty() {
        return note_text.to_string();
    }

    let mut result = note_text.to_string();
    let mut block_contents = Vec::new();

    for caps in BLOCK_TAG.captures_iter( note_text ) {
        let open_name = caps.get( 1 ).unwrap().as_str().trim();
        let close_name = caps.get( 3 ).unwrap().as_str().trim();
        if !open_name.eq_ignore_ascii_case( close_name ) {
            continue;
        }
        let content = caps.get( 2 ).unwrap().as_str().trim();
        block_contents.push( content.to_string() );

        if let Some( translated ) = translations.get( content ) {
            let whole = caps.get( 0 ).unwrap().as_str();
            let new = format!( "<{open_name}>\n{translated}\n</{open_name}>" );
            result = result.replacen( whole, &new, 1 );
        }
    }

    for caps in VALUE_TAG.captures_iter( note_text ) {
        let tag_name = caps.get( 1 ).unwrap().as_str().trim();
        let value = caps.get( 2 ).unwrap().as_str().trim();
        if let Some( translated ) = translations.get( value ) {
            let whole = caps.get( 0 ).unwrap().as_str();
            let new = format!( "<{tag_name}: {translated}>" );
            result = result.replacen( whole, &new, 1 );
        }
    }

    for ( original, translated ) in translations {
        if block_contents.contains( original ) {
            continue;
        }
        if result.contains( original.as_str() ) {
            result = result.replacen( original.as_str(), translated, 1 );
        }
    }

    result
}


#[ cfg( test ) ]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const NOTE: &str = concat!(
        "<SType: Magic>\n",
        "<Element: Fire>\n",
        "This is a custom description that should be translated.\n",
        "<Custom Death Message>\n",
        "%1 has been slain!\n",
        "</Custom Death Message>\n",
        "<Price: 100>",
    );

    #[ test ]
    fn parses_value_block_and_free_text_segments() {
        let segments = parse_note( NOTE );
        assert!( segments.iter().any( |s| s.kind == SegmentKind::FreeText
            && s.text.contains( "custom description" ) && s.translatable ) );
        assert!( segments.iter().any( |s| s.kind == SegmentKind::BlockTag
            && s.text == "%1 has been slain!" && s.translatable ) );
    }

    #[ test ]
    fn skip_list_tags_are_not_translatable() {
        let segments = parse_note( NOTE );
        let stype = segments.iter().find( |s| s.text == "Magic" ).unwrap();
        assert!( !stype.translatable );
        let price = segments.iter().find( |s| s.text == "100" ).unwrap();
        assert!( !price.translatable );
    }

    #[ test ]
    fn extract_translatable_collects_only_marked_segments() {
        let texts = extract_translatable( NOTE );
        assert!( texts.contains( &"This is a custom description that should be translated.".to_string() ) );
        assert!( texts.contains( &"%1 has been slain!".to_string() ) );
        assert!( !texts.iter().any( |t| t == "Magic" ) );
    }

    #[ test ]
    fn rebuild_note_swaps_translated_segments() {
        let mut translations = HashMap::new();
        translations.insert(
            "This is a custom description that should be translated.".to_string(),
            "Ceci est une description personnalisée qui doit être traduite.".to_string(),
        );
        translations.insert( "%1 has been slain!".to_string(), "%1 a été vaincu !".to_string() );

        let rebuilt = rebuild_note( NOTE, &translations );
        assert!( rebuilt.contains( "Ceci est une description personnalisée" ) );
        assert!( rebuilt.contains( "%1 a été vaincu !" ) );
        assert!( rebuilt.contains( "<SType: Magic>" ) );
    }
}
