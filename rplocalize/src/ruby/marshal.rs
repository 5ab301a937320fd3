//! Hand-rolled reader/writer for Ruby's `Marshal` binary format
//! (format version 4.8, the one every RPG Maker XP/VX/VX Ace engine
//! writes). There is no crate in this ecosystem with a documented,
//! stable surface for this format, so the tree shape below is owned
//! outright instead of being modeled after an assumed external API.
//!
//! Format reference: `marshal.c` in the Ruby source (`r_object0` for
//! reading, `w_object` for writing) — there is no public spec doc,
//! the byte-tag table below is transcribed from that implementation.
//!
//! Object/symbol back-references (`@n` / `;n` links) are read but
//! never written: `Marshal.load` does not require a stream to use
//! them, it is purely a size optimization, so [`dump`] always
//! serializes every value in full. This keeps the writer a third the
//! size of a reference implementation at the cost of larger output
//! files, which is an acceptable trade here since files are written
//! once per run, not repeatedly.

use crate::error::MarshalError;
use crate::lore::MARSHAL_MAX_DEPTH;

const MAJOR_VERSION: u8 = 4;
const MINOR_VERSION: u8 = 8;

/// One node of a parsed Marshal tree. Strings are raw bytes since XP/
/// VX/Ace games are routinely Shift-JIS, not UTF-8; callers decode
/// them with [`super::decode_ruby_bytes`].
#[ derive( Debug, Clone, PartialEq ) ]
pub enum Value {
    Nil,
    Bool( bool ),
    Integer( i64 ),
    Float( f64 ),
    String( Vec<u8> ),
    Symbol( String ),
    Array( Vec<Value> ),
    Hash( Vec<( Value, Value )> ),
    Object { class_name: String, variables: Vec<( String, Value )> },
}

/// Ivar name under which a `u`-tagged (`_dump`/`_load`) user-defined
/// object's opaque payload is stashed, e.g. `Table`, `Color`, `Tone`.
/// These binary blobs are never inspected for text, only carried
/// through untouched.
pub const USERDEF_IVAR: &str = "__userdef__";


/// Parse a `.rvdata2`/`.rxdata`/`.rvdata` buffer into its Marshal tree.
pub fn load( bytes: &[ u8 ] ) -> Result<Value, MarshalError> {
    let mut r = Reader { bytes, pos: 0, symbols: Vec::new(), objects: Vec::new() };
    r.read_header()?;
    r.read_value( 0 )
}

/// Re-serialize a Marshal tree back into bytes.
pub fn dump( value: &Value ) -> Result<Vec<u8>, MarshalError> {
    let mut w = Writer { out: Vec::new() };
    w.out.push( MAJOR_VERSION );
    w.out.push( MINOR_VERSION );
    w.write_value( value );
    Ok( w.out )
}


struct Reader<'b> {
    bytes: &'b [ u8 ],
    pos: usize,
    symbols: Vec<String>,
    objects: Vec<Value>,
}

impl<'b> Reader<'b> {
    fn read_header( &mut self ) -> Result<(), MarshalError> {
        let major = self.byte()?;
        let minor = self.byte()?;
        if major != MAJOR_VERSION || minor > MINOR_VERSION {
            return Err( MarshalError::Load( format!( "unsupported Marshal version {major}.{minor}" ) ) );
        }
        Ok( () )
    }

    fn byte( &mut self ) -> Result<u8, MarshalError> {
        let b = *self.bytes.get( self.pos ).ok_or_else( || MarshalError::Load( "unexpected end of input".into() ) )?;
        self.pos += 1;
        Ok( b )
    }

    fn take( &mut self, n: usize ) -> Result<&'b [ u8 ], MarshalError> {
        let end = self.pos.checked_add( n ).ok_or_else( || MarshalError::Load( "length overflow".into() ) )?;
        let slice = self.bytes.get( self.pos..end ).ok_or_else( || MarshalError::Load( "unexpected end of input".into() ) )?;
        self.pos = end;
        Ok( slice )
    }

    /// Ruby's variable-length integer encoding (`r_long` in `marshal.c`).
    fn read_fixnum( &mut self ) -> Result<i64, MarshalError> {
        let c = self.byte()? as i8;
        if c == 0 {
            return Ok( 0 );
        }
        if c > 0 {
            if c > 4 {
                return Ok( i64::from( c ) - 5 );
            }
            let n = c as usize;
            let mut x: i64 = 0;
            for i in 0..n {
                x |= i64::from( self.byte()? ) << ( 8 * i );
            }
            return Ok( x );
        }
        if c < -4 {
            return Ok( i64::from( c ) + 5 );
        }
        let n = ( -i64::from( c ) ) as usize;
        let mut x: i64 = -1;
        for i in 0..n {
            x &= !( 0xffi64 << ( 8 * i ) );
            x |= i64::from( self.byte()? ) << ( 8 * i );
        }
        Ok( x )
    }

    fn read_raw_string( &mut self ) -> Result<Vec<u8>, MarshalError> {
        let len = self.read_fixnum()?;
        if len < 0 {
            return Err( MarshalError::Load( "negative string length".into() ) );
        }
        Ok( self.take( len as usize )?.to_vec() )
    }

    fn read_symbol( &mut self ) -> Result<String, MarshalError> {
        let tag = self.byte()?;
        match tag {
            b':' => {
                let bytes = self.read_raw_string()?;
                let s = String::from_utf8_lossy( &bytes ).into_owned();
                self.symbols.push( s.clone() );
                Ok( s )
            }
            b';' => {
                let idx = self.read_fixnum()?;
                self.symbols.get( idx as usize ).cloned()
                    .ok_or_else( || MarshalError::Load( "symbol link out of range".into() ) )
            }
            other => Err( MarshalError::Load( format!( "expected symbol, found tag {other:#x}" ) ) ),
        }
    }

    fn read_value( &mut self, depth: usize ) -> Result<Value, MarshalError> {
        if depth > MARSHAL_MAX_DEPTH {
            return Err( MarshalError::TooDeep( MARSHAL_MAX_DEPTH ) );
        }

        let tag = self.byte()?;
        match tag {
            b'0' => Ok( Value::Nil ),
            b'T' => Ok( Value::Bool( true ) ),
            b'F' => Ok( Value::Bool( false ) ),
            b'i' => Ok( Value::Integer( self.read_fixnum()? ) ),
            b'f' => {
                let bytes = self.read_raw_string()?;
                let text = String::from_utf8_lossy( &bytes );
                let v = parse_ruby_float( &text )?;
                self.objects.push( Value::Float( v ) );
                Ok( Value::Float( v ) )
            }
            b'"' => {
                let bytes = self.read_raw_string()?;
                let v = Value::String( bytes );
                self.objects.push( v.clone() );
                Ok( v )
            }
            b':' | b';' => {
                self.pos -= 1;
                Ok( Value::Symbol( self.read_symbol()? ) )
            }
            b'[' => {
                let n = self.read_fixnum()?;
                let placeholder_idx = self.objects.len();
                self.objects.push( Value::Nil );
                let mut items = Vec::with_capacity( n.max( 0 ) as usize );
                for _ in 0..n {
                    items.push( self.read_value( depth + 1 )? );
                }
                let v = Value::Array( items );
                self.objects[ placeholder_idx ] = v.clone();
                Ok( v )
            }
            b'{' | b'}' => {
                let n = self.read_fixnum()?;
                let placeholder_idx = self.objects.len();
                self.objects.push( Value::Nil );
                let mut pairs = Vec::with_capacity( n.max( 0 ) as usize );
                for _ in 0..n {
                    let k = self.read_value( depth + 1 )?;
                    let v = self.read_value( depth + 1 )?;
                    pairs.push( ( k, v ) );
                }
                if tag == b'}' {
                    // Hash-with-default: one trailing value is the default.
                    // RPG Maker project data never round-trips this shape,
                    // so it is read (to keep the stream aligned) and dropped.
                    let _default = self.read_value( depth + 1 )?;
                }
                let v = Value::Hash( pairs );
                self.objects[ placeholder_idx ] = v.clone();
                Ok( v )
            }
            b'o' => {
                let class_name = self.read_symbol()?;
                let placeholder_idx = self.objects.len();
                self.objects.push( Value::Nil );
                let n = self.read_fixnum()?;
                let mut variables = Vec::with_capacity( n.max( 0 ) as usize );
                for _ in 0..n {
                    let key = self.read_symbol()?;
                    let value = self.read_value( depth + 1 )?;
                    variables.push( ( key, value ) );
                }
                let v = Value::Object { class_name, variables };
                self.objects[ placeholder_idx ] = v.clone();
                Ok( v )
            }
            b'u' => {
                let class_name = self.read_symbol()?;
                let bytes = self.read_raw_string()?;
                let v = Value::Object {
                    class_name,
                    variables: vec![ ( USERDEF_IVAR.to_string(), Value::String( bytes ) ) ],
                };
                self.objects.push( v.clone() );
                Ok( v )
            }
            b'I' => {
                // The wrapped value (almost always a String) registers
                // its own link-table slot when its own tag is read below;
                // the IVAR wrapper itself is not a distinct linkable
                // object in Ruby's object table.
                let inner = self.read_value( depth + 1 )?;
                let n = self.read_fixnum()?;
                for _ in 0..n {
                    let _key = self.read_symbol()?;
                    let _value = self.read_value( depth + 1 )?;
                }
                // Encoding ivars (`@E`/`@encoding`) are metadata about how
                // the raw bytes were sourced; `decode_ruby_bytes`'s
                // fallback chain makes them unnecessary to keep.
                Ok( inner )
            }
            b'@' => {
                let idx = self.read_fixnum()?;
                self.objects.get( idx as usize ).cloned()
                    .ok_or_else( || MarshalError::Load( "object link out of range".into() ) )
            }
            other => Err( MarshalError::Load( format!( "unsupported Marshal tag {other:#x} ({})", other as char ) ) ),
        }
    }
}

fn parse_ruby_float( text: &str ) -> Result<f64, MarshalError> {
    match text {
        "inf" => Ok( f64::INFINITY ),
        "-inf" => Ok( f64::NEG_INFINITY ),
        "nan" => Ok( f64::NAN ),
        other => other.parse::<f64>().map_err( |_| MarshalError::Load( format!( "bad float literal \"{other}\"" ) ) ),
    }
}


struct Writer {
    out: Vec<u8>,
}

impl Writer {
    fn write_fixnum( &mut self, x: i64 ) {
        if x == 0 {
            self.out.push( 0 );
            return;
        }
        if x > 0 && x < 123 {
            self.out.push( ( x + 5 ) as u8 );
            return;
        }
        if x < 0 && x > -124 {
            self.out.push( ( ( x - 5 ) & 0xff ) as i64 as u8 );
            return;
        }

        // Capped at 4 bytes: the byte-count marker and the 5..127/
        // -128..-5 inline ranges share one signed byte, so only a
        // 1..4 byte count is unambiguous on the read side (the
        // scheme is inherently 32-bit; every numeric field RPG Maker
        // project data carries fits comfortably inside it).
        let mut bytes = [ 0u8; 4 ];
        let mut v = x;
        let mut len = 0usize;
        for b in bytes.iter_mut() {
            *b = ( v & 0xff ) as u8;
            v >>= 8;
            len += 1;
            if v == 0 {
                self.out.push( len as u8 );
                self.out.extend_from_slice( &bytes[ ..len ] );
                return;
            }
            if v == -1 {
                self.out.push( ( -( len as i64 ) ) as u8 );
                self.out.extend_from_slice( &bytes[ ..len ] );
                return;
            }
        }
        self.out.push( len as u8 );
        self.out.extend_from_slice( &bytes[ ..len ] );
    }

    fn write_raw_string( &mut self, bytes: &[ u8 ] ) {
        self.write_fixnum( bytes.len() as i64 );
        self.out.extend_from_slice( bytes );
    }

    fn write_symbol( &mut self, s: &str ) {
        self.out.push( b':' );
        self.write_raw_string( s.as_bytes() );
    }

    fn write_value( &mut self, value: &Value ) {
        match value {
            Value::Nil => self.out.push( b'0' ),
            Value::Bool( true ) => self.out.push( b'T' ),
            Value::Bool( false ) => self.out.push( b'F' ),
            Value::Integer( n ) => {
                self.out.push( b'i' );
                self.write_fixnum( *n );
            }
            Value::Float( f ) => {
                self.out.push( b'f' );
                let text = format_ruby_float( *f );
                self.write_raw_string( text.as_bytes() );
            }
            Value::String( bytes ) => {
                // Always marked UTF-8: translated text is UTF-8, and any
                // untouched string is re-emitted the same way, which is
                // what every localization pass over this format does.
                self.out.push( b'I' );
                self.out.push( b'"' );
                self.write_raw_string( bytes );
                self.write_fixnum( 1 );
                self.write_symbol( "E" );
                self.out.push( b'T' );
            }
            Value::Symbol( s ) => self.write_symbol( s ),
            Value::Array( items ) => {
                self.out.push( b'[' );
                self.write_fixnum( items.len() as i64 );
                for item in items {
                    self.write_value( item );
                }
            }
            Value::Hash( pairs ) => {
                self.out.push( b'{' );
                self.write_fixnum( pairs.len() as i64 );
                for ( k, v ) in pairs {
                    self.write_value( k );
                    self.write_value( v );
                }
            }
            Value::Object { class_name, variables } => {
                if variables.len() == 1 && variables[ 0 ].0 == USERDEF_IVAR {
                    if let Value::String( bytes ) = &variables[ 0 ].1 {
                        self.out.push( b'u' );
                        self.write_symbol( class_name );
                        self.write_raw_string( bytes );
                        return;
                    }
                }
                self.out.push( b'o' );
                self.write_symbol( class_name );
                self.write_fixnum( variables.len() as i64 );
                for ( key, value ) in variables {
                    self.write_symbol( key );
                    self.write_value( value );
                }
            }
        }
    }
}

fn format_ruby_float( f: f64 ) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if f.is_nan() {
        return "nan".to_string();
    }
    format!( "{f}" )
}


#[ cfg( test ) ]
mod tests {
    use super::*;

    #[ test ]
    fn round_trips_small_and_large_fixnums() {
        for n in [ 0i64, 1, -1, 4, -4, 5, -5, 122, -123, 1000, -1000, 70000, -70000, i64::from( i32::MAX ), i64::from( i32::MIN ) ] {
            let mut w = Writer { out: Vec::new() };
            w.write_fixnum( n );
            let mut r = Reader { bytes: &w.out, pos: 0, symbols: Vec::new(), objects: Vec::new() };
            assert_eq!( r.read_fixnum().unwrap(), n, "round-trip failed for {n}" );
        }
    }

    #[ test ]
    fn round_trips_nil_bool_integer_float_string_symbol() {
        for v in [
            Value::Nil,
            Value::Bool( true ),
            Value::Bool( false ),
            Value::Integer( 42 ),
            Value::Integer( -12345 ),
            Value::Float( 3.5 ),
            Value::String( b"hello".to_vec() ),
            Value::Symbol( "name".to_string() ),
        ] {
            let bytes = dump( &v ).unwrap();
            let back = load( &bytes ).unwrap();
            assert_eq!( back, v );
        }
    }

    #[ test ]
    fn round_trips_nested_array_hash_object() {
        let tree = Value::Array( vec![
            Value::Nil,
            Value::Object {
                class_name: "RPG::Actor".to_string(),
                variables: vec![
                    ( "@name".to_string(), Value::String( b"Hero".to_vec() ) ),
                    ( "@id".to_string(), Value::Integer( 1 ) ),
                    ( "@params".to_string(), Value::Hash( vec![
                        ( Value::Symbol( "hp".to_string() ), Value::Integer( 100 ) ),
                    ] ) ),
                ],
            },
        ] );

        let bytes = dump( &tree ).unwrap();
        let back = load( &bytes ).unwrap();
        assert_eq!( back, tree );
    }

    #[ test ]
    fn round_trips_userdefined_blob_unchanged() {
        let table = Value::Object {
            class_name: "Table".to_string(),
            variables: vec![ ( USERDEF_IVAR.to_string(), Value::String( vec![ 1, 2, 3, 4, 0, 0 ] ) ) ],
        };
        let bytes = dump( &table ).unwrap();
        let back = load( &bytes ).unwrap();
        assert_eq!( back, table );
    }

    #[ test ]
    fn reads_back_references_to_repeated_symbols_and_strings() {
        // The `@name` symbol is written literally once, then linked; a
        // third array element links back to the first object's string
        // value by object index, the way Ruby's own `Marshal.dump`
        // would emit two ivars or array slots that share one object.
        let mut w = Writer { out: Vec::new() };
        w.out.push( MAJOR_VERSION );
        w.out.push( MINOR_VERSION );
        w.out.push( b'[' );
        w.write_fixnum( 3 );
        w.out.push( b'o' );
        w.write_symbol( "RPG::Actor" );
        w.write_fixnum( 1 );
        w.write_symbol( "@name" );
        w.out.push( b'"' );
        w.write_raw_string( b"Alice" );
        w.out.push( b'o' );
        w.out.push( b';' );
        w.write_fixnum( 0 );
        w.write_fixnum( 1 );
        w.out.push( b';' );
        w.write_fixnum( 1 );
        w.out.push( b'"' );
        w.write_raw_string( b"Bob" );
        w.out.push( b'@' );
        w.write_fixnum( 2 );

        let back = load( &w.out ).unwrap();
        let Value::Array( items ) = back else { panic!( "expected array" ) };
        let Value::Object { variables: v1, .. } = &items[ 0 ] else { panic!() };
        let Value::Object { variables: v2, .. } = &items[ 1 ] else { panic!() };
        assert_eq!( v1[ 0 ].0, "@name" );
        assert_eq!( v2[ 0 ].0, "@name" );
        assert_eq!( items[ 2 ], Value::String( b"Alice".to_vec() ) );
    }

    #[ test ]
    fn rejects_truncated_input() {
        assert!( load( &[ 4, 8, b'i' ] ).is_err() );
    }
}
