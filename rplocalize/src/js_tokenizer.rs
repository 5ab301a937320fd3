//! Non-parsing JavaScript string tokenizer.
//!
//! Extracts string literals from the JS snippets embedded in Script
//! event commands (codes 355/655). This is not a JS parser: it only
//! walks quote/comment/template state far enough to find literal
//! string tokens and their positions, the same scope as
//! `original_source/src/core/parsers/js_tokenizer.py`.

use crate::safety::is_safe_to_translate;

/// One extracted string literal: char-index span (`start` inclusive,
/// `end` exclusive, both pointing at the quote characters), its
/// unescaped value, and the quote character used.
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

        if c == '/' && i + 1 < length && chars[ i + 1 ] == '/' {
            i += 2;
            while i < length && chars[ i ] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '/' && i + 1 < length && chars[ i + 1 ] == '*' {
            i += 2;
            let mut closed = false;
            while i + 1 < length {
                if chars[ i ] == '*' && chars[ i + 1 ] == '/' {
                    i += 2;
                    closed = true;
                    break;
                }
                i += 1;
            }
            if !closed {
                i = length;
            }
            continue;
        }

        if c == '"' || c == '\'' || c == '`' {
            let start = i;
            let quote = c;
            i += 1;
            let mut value = String::new();
            let mut terminated = false;

            while i < length {
                let ch = chars[ i ];

                if ch == '\\' && quote != '`' {
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

                if ch == '\\' && quote == '`' {
                    i += 1;
                    if i < length {
                        value.push( chars[ i ] );
                    }
                    i += 1;
                    continue;
                }

                if ch == quote {
                    i += 1;
                    terminated = true;
                    break;
                }

                if quote == '`' && ch == '$' && i + 1 < length && chars[ i + 1 ] == '{' {
                    let mut depth = 1;
                    i += 2;
                    while i < length && depth > 0 {
                        match chars[ i ] {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        i += 1;
                    }
                    value.push_str( "${...}" );
                    continue;
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

/// Same as [`extract_strings`] filtered down to fragments that look
/// like natural-language text worth sending to translation.
#[ tracing::instrument( skip( code ) ) ]
pub fn extract_translatable_strings( code: &str ) -> Vec<StringToken> {
    let chars: Vec<char> = code.chars().collect();

    extract_strings( code ).into_iter()
        .filter( |tok| {
            let trimmed = tok.value.trim();
            if trimmed.is_empty() || trimmed.chars().count() < 2 {
                return false;
            }
            if !is_safe_to_translate( &tok.value ) {
                return false;
            }
            if is_in_comparison( &chars, tok.start ) {
                return false;
            }

            let has_space = tok.value.contains( ' ' );
            let has_non_ascii = tok.value.chars().any( |c| !c.is_ascii() );
            if !has_space && !has_non_ascii && tok.value.chars().count() < 4 {
                return false;
            }

            true
        } )
        .collect()
}

fn is_in_comparison( chars: &[char], string_start: usize ) -> bool {
    let mut i = string_start as isize - 1;
    while i >= 0 && matches!( chars[ i as usize ], ' ' | '\t' ) {
        i -= 1;
    }
    if i < 0 {
        return false;
    }
    let i = i as usize;

    let window = |n: usize| -> String {
        if i + 1 >= n {
            chars[ i + 1 - n..=i ].iter().collect()
        } else {
            String::new()
        }
    };

    matches!( window( 3 ).as_str(), "===" | "!==" ) || matches!( window( 2 ).as_str(), "==" | "!=" )
}

/// Splice a new, re-escaped value into `code` at a token's position.
/// Multiple replacements on the same source must be applied
/// right-to-left (highest `start` first) since earlier splices shift
/// every later char index.
#[ tracing::instrument( skip( code, new_value ) ) ]
pub fn replace_string_at( code: &str, token: &StringToken, new_value: &str ) -> String {
    let chars: Vec<char> = code.chars().collect();
    let escaped = escape_for_js( new_value, token.quote );

    let mut out = String::new();
    out.extend( &chars[ ..token.start ] );
    out.push( token.quote );
    out.push_str( &escaped );
    out.push( token.quote );
    out.extend( &chars[ token.end.min( chars.len() ).. ] );
    out
}

fn escape_for_js( value: &str, quote: char ) -> String {
    let mut result = value.replace( '\\', "\\\\" );
    match quote {
        '"' => result = result.replace( '"', "\\\"" ),
        '\'' => result = result.replace( '\'', "\\'" ),
        '`' => {
            result = result.replace( '`', "\\`" );
            result = result.replace( "${", "\\${" );
        }
        _ => {}
    }
    result.replace( '\n', "\\n" ).replace( '\r', "\\r" ).replace( '\t', "\\t" )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn extracts_double_single_and_template_strings() {
        let code = r#"$gameMessage.add("Hello there"); var x = 'ok'; let y = `Hi ${name}!`;"#;
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 3 );
        assert_eq!( tokens[ 0 ].value, "Hello there" );
        assert_eq!( tokens[ 1 ].value, "ok" );
        assert_eq!( tokens[ 2 ].value, "Hi ${...}!" );
    }

    #[ test ]
    fn skips_line_and_block_comments() {
        let code = "// a \"fake\" string\nlet x = /* \"also fake\" */ \"real one\";";
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 1 );
        assert_eq!( tokens[ 0 ].value, "real one" );
    }

    #[ test ]
    fn translatable_filter_drops_technical_strings() {
        let code = r#"$gameMessage.add("Hello there, friend!"); x = ("variableName"); if (a == "TRUE") {}"#;
        let tokens = extract_translatable_strings( code );
        assert_eq!( tokens.len(), 1 );
        assert_eq!( tokens[ 0 ].value, "Hello there, friend!" );
    }

    #[ test ]
    fn replace_string_at_reescapes_for_quote() {
        let code = r#"$gameMessage.add("Hello there");"#;
        let tokens = extract_strings( code );
        let replaced = replace_string_at( code, &tokens[ 0 ], "Bonjour \"ami\"" );
        assert_eq!( replaced, r#"$gameMessage.add("Bonjour \"ami\""); "#.trim_end() );
    }

    #[ test ]
    fn right_to_left_multi_replacement_keeps_indices_valid() {
        let code = r#"f("one", "two")"#;
        let tokens = extract_strings( code );
        assert_eq!( tokens.len(), 2 );
        let mut out = code.to_string();
        for tok in tokens.iter().rev() {
            out = replace_string_at( &out, tok, &format!( "{}!", tok.value ) );
        }
        assert_eq!( out, r#"f("one!", "two!")"# );
    }
}
