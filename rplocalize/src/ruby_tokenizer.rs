//! Non-parsing Ruby string tokenizer.
//!
//! Mirrors [`crate::js_tokenizer`] but for the much smaller grammar
//! Ruby script bodies inside `Scripts.rvdata2` actually need: a `#`
//! line comment and single/double quoted strings with `\`-escaping.
//! Grounded on `original_source/src/core/parsers/ruby_parser.py`
//! (`_tokenize_ruby_script`).

/// One extracted string literal: char-index span (`start` inclusive,
/// `end` exclusive), its unescaped value, and the quote character.
#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub struct StringToken {
    pub start: usize,
    pub end: usize,
    pub value: String,
    pub quote: char,
}

/// Walk `code` and return every string literal, in source order.
#[ tracing::instrument( skip( code ) ) ]
pub fn extract_strings( code: &str ) -> Vec<StringToken> {
    let chars: Vec<char> = code.chars().collect();
    let length = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < length {
        let c = chars[ i ];

        if c == '#' {
            while i < length && chars[ i ] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '\'' || c == '"' {
            let start = i;
            let quote = c;
            i += 1;
            let mut value = String::new();
            let mut terminated = false;

            while i < length {
                let ch = chars[ i ];

                if ch == '\\' {
                    i += 1;
                    if i < length {
                        value.push( match chars[ i ] {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '\\' => '\\',
                            '\'' => '\'',
                            '"' => '"',
                            '0' => '\0',
                            other => other,
                        } );
                    }
                    i += 1;
                    continue;
                }

                if ch == quote {
                    i += 1;
                    terminated = true;
                    break;
                }

                value.push( ch );
                i += 1;
            }

            if terminated {
                tokens.push( StringToken { start, end: i, value, quote } );
            }
            continue;
        }

        i += 1;
    }

    tokens
}

/// Rejects identifier-only strings, file extensions, colon-prefixed
/// symbols, and strings without spaces and without non-ASCII content
/// ("Script validity filter").
#[ tracing::instrument( skip( text ) ) ]
pub fn is_valid_script_string( text: &str ) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() < 2 {
        return false;
    }
    if trimmed.starts_with( ':' ) {
        return false;
    }
    if trimmed.chars().all( |c| c.is_ascii_alphanumeric() || c == '_' ) {
        return false;
    }

    const EXTENSIONS: &[ &str ] = &[
        ".png", ".jpg", ".jpeg", ".bmp", ".ogg", ".wav", ".mp3", ".rvdata2",
    ];
    let lower = trimmed.to_lowercase();
    if EXTENSIONS.iter().any( |ext| lower.ends_with( ext ) ) {
        return false;
    }

    let has_space = trimmed.contains( ' ' );
    let has_non_ascii = trimmed.chars().any( |c| !c.is_ascii() );
    has_space || has_non_ascii
}

/// Filtered variant of [`extract_strings`], keeping only fragments
/// that pass [`is_valid_script_string`] and deduplicating by value in
/// first-occurrence order (mirrors the Python original's
/// `seen_strings` set, since the same literal can recur many times in
/// one script body without needing a distinct translation slot each
/// time — but here every occurrence still gets its own path so
/// injection can target it, so dedup is left to the caller).
#[ tracing::instrument( skip( code ) ) ]
pub fn extract_translatable_strings( code: &str ) -> Vec<StringToken> {
    extract_strings( code ).into_iter()
        .filter( |tok| is_valid_script_string( &tok.value ) )
        .collect()
}

/// Splice a new, re-escaped value into `code` at a token's position.
/// Multiple replacements must be applied right-to-left.
#[ tracing::instrument( skip( code, new_value ) ) ]
pub fn replace_string_at( code: &str, token: &StringToken, new_value: &str ) -> String {
    let chars: Vec<char> = code.chars().collect();
    let escaped = escape_for_ruby( new_value, token.quote );

    let mut out = String::new();
    out.extend( &chars[ ..token.start ] );
    out.push( token.quote );
    out.push_str( &escaped );
    out.push( token.quote );
    out.extend( &chars[ token.end.min( chars.len() ).. ] );
    out
}

fn escape_for_ruby( value: &str, quote: char ) -> String {
    let mut result = value.replace( '\\', "\\\\" );
    result = result.replace( quote, &format!( "\\{quote}" ) );
    result.replace( '\n', "\\n" ).replace( '\r', "\\r" ).replace( '\t', "\\t" )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn extracts_single_and_double_quoted_strings() {
        let code = r#"text = "Hello there" + 'ok'"#;
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 2 );
        assert_eq!( tokens[ 0 ].value, "Hello there" );
        assert_eq!( tokens[ 1 ].value, "ok" );
    }

    #[ test ]
    fn skips_line_comments() {
        let code = "# a \"fake\" string\nputs \"real one\"";
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 1 );
        assert_eq!( tokens[ 0 ].value, "real one" );
    }

    #[ test ]
    fn validity_filter_rejects_identifiers_symbols_and_extensions() {
        assert!( !is_valid_script_string( "variable_name" ) );
        assert!( !is_valid_script_string( ":sym" ) );
        assert!( !is_valid_script_string( "Actor1.png" ) );
        assert!( is_valid_script_string( "Game Over" ) );
        assert!( is_valid_script_string( "勇者" ) );
    }

    #[ test ]
    fn replace_string_at_reescapes_for_quote() {
        let code = r#"puts "Hello there""#;
        let tokens = extract_strings( code );
        let replaced = replace_string_at( code, &tokens[ 0 ], "a \"quoted\" word" );
        assert_eq!( replaced, r#"puts "a \"quoted\" word""# );
    }

    #[ test ]
    fn right_to_left_multi_replacement_keeps_indices_valid() {
        let code = r#"f('one', 'two')"#;
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 2 );
        let mut out = code.to_string();
        for tok in tokens.iter().rev() {
            out = replace_string_at( &out, tok, &format!( "{}!", tok.value ) );
        }
        assert_eq!( out, r#"f('one!', 'two!')"# );
    }
}
